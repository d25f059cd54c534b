//! CSV export of the full record set.

use crate::record::{Choice, Record};

/// Column headers, in output order.
pub const CSV_HEADER: [&str; 11] = [
  "Name",
  "Father Name",
  "Roll No",
  "Department",
  "Grade",
  "Contact",
  "Email",
  "Gender",
  "Blood Group",
  "DOB",
  "Address",
];

/// File name offered to the browser.
pub const CSV_FILE_NAME: &str = "students.csv";

/// Render `records` as CSV: one header line, then one line per record in the
/// given order. Missing values are empty cells; lines end with CRLF.
pub fn build_csv(records: &[Record]) -> String {
  let mut out = String::new();
  push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));

  for record in records {
    let f = &record.fields;
    push_row(
      &mut out,
      [
        f.student_name.clone(),
        f.father_name.clone(),
        f.roll_no.clone(),
        code(f.department),
        code(f.student_grade),
        f.contact.clone().unwrap_or_default(),
        f.email.clone().unwrap_or_default(),
        f.gender.clone(),
        f.blood_group.clone(),
        f.dob.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        f.address.clone(),
      ],
    );
  }
  out
}

fn code<C: Choice>(value: Option<C>) -> String {
  value.map(|c| c.code().to_owned()).unwrap_or_default()
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
  let row: Vec<String> = cells.into_iter().map(|c| csv_escape(&c)).collect();
  out.push_str(&row.join(","));
  out.push_str("\r\n");
}

/// Quote a cell if it contains a delimiter, quote or line break.
fn csv_escape(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}
