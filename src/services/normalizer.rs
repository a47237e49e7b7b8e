use crate::{
    models::{MobileNumber, UserDraft},
    services::parser::{CellValue, Row},
};

pub const NAME_HEADER: &str = "Name";
pub const EMAIL_HEADER: &str = "Email";
pub const MOBILE_HEADER: &str = "MobileNumber";
pub const CITY_HEADER: &str = "City";

/// Maps a parsed row onto the canonical user shape.
///
/// Headers are matched exactly (case-sensitive). Unknown columns are dropped
/// and no validation is performed on the values.
pub fn normalize(row: &Row) -> UserDraft {
    UserDraft {
        name: text_field(row, NAME_HEADER),
        email: text_field(row, EMAIL_HEADER),
        mobile_number: row.get(MOBILE_HEADER).map(mobile_number),
        city: text_field(row, CITY_HEADER),
    }
}

fn text_field(row: &Row, header: &str) -> Option<String> {
    row.get(header).map(CellValue::as_text)
}

fn mobile_number(cell: &CellValue) -> MobileNumber {
    match cell {
        CellValue::Number(n) => MobileNumber::from_f64(*n),
        CellValue::Text(s) => MobileNumber::from_text(s),
        CellValue::Bool(_) => MobileNumber::Text(cell.as_text()),
    }
}
