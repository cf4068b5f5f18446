//! BIFF8 record type constants ([MS-XLS] §2.3).

// Stream structure
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// BOF record ids used before BIFF5
pub const BOF_BIFF2: u16 = 0x0009;
pub const BOF_BIFF3: u16 = 0x0209;
pub const BOF_BIFF4: u16 = 0x0409;

// Workbook globals
pub const BOUNDSHEET: u16 = 0x0085;
pub const SST: u16 = 0x00FC;

// Cell records
pub const LABELSST: u16 = 0x00FD;
pub const LABEL: u16 = 0x0204;
pub const NUMBER: u16 = 0x0203;
pub const RK: u16 = 0x027E;
pub const MULRK: u16 = 0x00BD;
pub const BOOLERR: u16 = 0x0205;
pub const FORMULA: u16 = 0x0006;
pub const STRING: u16 = 0x0207;

// Sheet structure
pub const MERGECELLS: u16 = 0x00E5;

// BOF substream types
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;

/// BOUNDSHEET sheet type of a worksheet (charts are 0x02, VBA modules 0x06)
pub const SHEET_TYPE_WORKSHEET: u8 = 0x00;

pub const BIFF8_VERSION: u16 = 0x0600;
