use super::bus::BusWidth;
use super::command::{self, function};
use super::{Config, Font};

/// DDRAM addresses are seven bits wide
const DDRAM_ADDRESS_MASK: u8 = 0x7F;

/// Cached instruction bytes that are rewritten one flag at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cached {
    EntryMode,
    DisplayControl,
}

/// Last entry mode, display control and function set bytes sent to the
/// display, plus its geometry.
///
/// The driver computes a new byte with [`CommandState::with_flag`], sends it,
/// and only then stores it, so the cache never holds a byte the display has
/// not accepted.
#[derive(Debug, Clone)]
pub(crate) struct CommandState {
    entry_mode: u8,
    display_control: u8,
    function_set: u8,
    rows: u8,
    cols: u8,
    row_bases: [u8; 4],
}

impl CommandState {
    /// Defaults: text left to right, no auto shift, display on, cursor and
    /// blink off
    pub(crate) fn new(config: &Config, width: BusWidth) -> Self {
        let rows = config.rows.max(1).min(4);
        // rows 2 and 3 continue rows 0 and 1 in DDRAM
        let max_cols = if rows > 2 { 20 } else { 40 };
        let cols = config.cols.max(1).min(max_cols);

        let mut function_set = command::FUNCTION_SET;
        if width == BusWidth::Eight {
            function_set |= function::EIGHT_BIT_BUS;
        }
        if rows > 1 {
            function_set |= function::TWO_LINE;
        } else if config.font == Font::Dots5x10 {
            function_set |= function::FONT_5X10;
        }

        CommandState {
            entry_mode: command::ENTRY_MODE_SET | command::entry::INCREMENT,
            display_control: command::DISPLAY_CONTROL | command::display::DISPLAY_ON,
            function_set,
            rows,
            cols,
            row_bases: [0x00, 0x40, cols, 0x40 + cols],
        }
    }

    pub(crate) fn get(&self, register: Cached) -> u8 {
        match register {
            Cached::EntryMode => self.entry_mode,
            Cached::DisplayControl => self.display_control,
        }
    }

    /// The cached byte with `flag` set or cleared, the cache left untouched
    pub(crate) fn with_flag(&self, register: Cached, flag: u8, on: bool) -> u8 {
        let value = self.get(register);
        if on {
            value | flag
        } else {
            value & !flag
        }
    }

    /// Record a byte the display has accepted
    pub(crate) fn store(&mut self, register: Cached, value: u8) {
        match register {
            Cached::EntryMode => self.entry_mode = value,
            Cached::DisplayControl => self.display_control = value,
        }
    }

    pub(crate) fn function_set(&self) -> u8 {
        self.function_set
    }

    pub(crate) fn rows(&self) -> u8 {
        self.rows
    }

    pub(crate) fn cols(&self) -> u8 {
        self.cols
    }

    /// DDRAM address of a position, out of range row and column saturate
    pub(crate) fn ddram_address(&self, row: u8, col: u8) -> u8 {
        let row = row.min(self.rows - 1);
        let col = col.min(self.cols - 1);
        (self.row_bases[usize::from(row)] + col) & DDRAM_ADDRESS_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(rows: u8, cols: u8) -> Config {
        Config {
            rows,
            cols,
            font: Font::Dots5x8,
        }
    }

    #[test]
    fn test_function_set() {
        let state = CommandState::new(&config(2, 16), BusWidth::Four);
        assert_eq!(state.function_set(), 0x28);

        let state = CommandState::new(&config(1, 16), BusWidth::Eight);
        assert_eq!(state.function_set(), 0x30);

        let state = CommandState::new(
            &Config {
                font: Font::Dots5x10,
                ..config(1, 16)
            },
            BusWidth::Eight,
        );
        assert_eq!(state.function_set(), 0x34);
    }

    #[test]
    fn test_with_flag_leaves_cache() {
        let mut state = CommandState::new(&config(2, 16), BusWidth::Four);
        let value = state.with_flag(Cached::EntryMode, command::entry::AUTO_SHIFT, true);
        assert_eq!(value, 0x07);
        assert_eq!(state.get(Cached::EntryMode), 0x06);

        state.store(Cached::EntryMode, value);
        assert_eq!(state.get(Cached::EntryMode), 0x07);
    }

    #[test]
    fn test_four_rows_limit_columns() {
        let state = CommandState::new(&config(4, 40), BusWidth::Four);
        assert_eq!(state.cols(), 20);
        assert_eq!(state.ddram_address(3, 39), 0x54 + 19);
        assert_eq!(state.ddram_address(2, 39), 0x14 + 19);

        let state = CommandState::new(&config(2, 40), BusWidth::Four);
        assert_eq!(state.cols(), 40);
        assert_eq!(state.ddram_address(1, 39), 0x67);
    }

    proptest! {
        #[test]
        fn prop_cursor_address_clamps(rows in 1u8..=4, cols in 1u8..=40, row: u8, col: u8) {
            let state = CommandState::new(&config(rows, cols), BusWidth::Four);
            let cols = if rows > 2 { cols.min(20) } else { cols };
            let bases = [0x00, 0x40, cols, 0x40 + cols];
            let expected = bases[usize::from(row.min(rows - 1))] + col.min(cols - 1);
            let address = state.ddram_address(row, col);
            prop_assert_eq!(address, expected);
            prop_assert!(address <= 0x7F);
        }

        #[test]
        fn prop_rows_do_not_overlap(rows in 1u8..=4, cols in 1u8..=40) {
            let state = CommandState::new(&config(rows, cols), BusWidth::Four);
            let mut seen = std::vec::Vec::new();
            for row in 0..state.rows() {
                for col in 0..state.cols() {
                    let address = state.ddram_address(row, col);
                    prop_assert!(!seen.contains(&address));
                    seen.push(address);
                }
            }
        }
    }
}
