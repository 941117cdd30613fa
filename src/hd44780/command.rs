//! Instruction bytes and their flags

/// Clear display, address counter to 0
pub const CLEAR_DISPLAY: u8 = 1 << 0;
/// Address counter to 0, undo display shift
pub const RETURN_HOME: u8 = 1 << 1;
/// Entry mode set
pub const ENTRY_MODE_SET: u8 = 1 << 2;
/// Display on/off control
pub const DISPLAY_CONTROL: u8 = 1 << 3;
/// Cursor or display shift
pub const CURSOR_SHIFT: u8 = 1 << 4;
/// Function set
pub const FUNCTION_SET: u8 = 1 << 5;
/// Set CGRAM address
pub const SET_CGRAM_ADDR: u8 = 1 << 6;
/// Set DDRAM address
pub const SET_DDRAM_ADDR: u8 = 1 << 7;

/// Entry mode flags
pub mod entry {
    /// Increment the address counter (text left to right)
    pub const INCREMENT: u8 = 1 << 1;
    /// Shift the display on each write
    pub const AUTO_SHIFT: u8 = 1 << 0;
}

/// Display control flags
pub mod display {
    /// Display on
    pub const DISPLAY_ON: u8 = 1 << 2;
    /// Underline cursor on
    pub const CURSOR_ON: u8 = 1 << 1;
    /// Blinking block cursor on
    pub const BLINK_ON: u8 = 1 << 0;
}

/// Cursor and display shift flags
pub mod shift {
    /// Shift the display instead of the cursor
    pub const DISPLAY: u8 = 1 << 3;
    /// Shift right instead of left
    pub const RIGHT: u8 = 1 << 2;
}

/// Function set flags
pub mod function {
    /// 8-bit interface
    pub const EIGHT_BIT_BUS: u8 = 1 << 4;
    /// Two display lines
    pub const TWO_LINE: u8 = 1 << 3;
    /// 5x10 dot font
    pub const FONT_5X10: u8 = 1 << 2;
}
