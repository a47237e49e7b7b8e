use crate::{
    models::{MobileNumber, UserRecord},
    utils::error::AppError,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_xlsxwriter::{Format, Workbook};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Users";

/// Header label and column width, in export order
const COLUMNS: [(&str, f64); 4] = [
    ("Name", 20.0),
    ("Email", 30.0),
    ("Mobile Number", 15.0),
    ("City", 20.0),
];

/// Serializes users into an .xlsx workbook, one row per user in the given
/// order. An empty slice still yields a valid workbook with the header row.
pub fn build_workbook(users: &[UserRecord]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (col, (header, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, *width)?;
        worksheet.write_string_with_format(0, col, *header, &header_format)?;
    }

    for (idx, user) in users.iter().enumerate() {
        let row = (idx + 1) as u32;

        if let Some(name) = &user.name {
            worksheet.write_string(row, 0, name)?;
        }
        if let Some(email) = &user.email {
            worksheet.write_string(row, 1, email)?;
        }
        match &user.mobile_number {
            Some(MobileNumber::Number(n)) if MobileNumber::is_exact(*n) => {
                worksheet.write_number(row, 2, *n as f64)?;
            }
            Some(MobileNumber::Number(n)) => {
                worksheet.write_string(row, 2, n.to_string())?;
            }
            Some(MobileNumber::Text(s)) => {
                worksheet.write_string(row, 2, s)?;
            }
            None => {}
        }
        if let Some(city) = &user.city {
            worksheet.write_string(row, 3, city)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// `users_<ISO timestamp>.xlsx` with ':' replaced so the name is portable.
pub fn export_filename(now: DateTime<Utc>) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("users_{}.xlsx", timestamp)
}
