//! CSV serialization of completed numbers.

use chrono::Local;

/// CRM import sheet: `Mobile,PC`, one row per completed number.
pub fn crm_import_csv(completed: &[String], flag_value: &str) -> String {
    let mut out = String::from("Mobile,PC\n");
    for number in completed {
        out.push_str(&format!("{number},{flag_value}\n"));
    }
    out
}

/// Dated report: `Phone Number,PC Status,Date Completed`.
pub fn dated_report_csv(completed: &[String], flag_value: &str) -> String {
    render_dated(
        completed,
        flag_value,
        &Local::now().format("%Y-%m-%d").to_string(),
    )
}

/// Default file name for an export, stamped with today's date.
pub fn default_export_path(dated: bool) -> String {
    let date = Local::now().format("%Y-%m-%d");
    if dated {
        format!("completed_contacts_{date}.csv")
    } else {
        format!("crm_import_{date}.csv")
    }
}

fn render_dated(completed: &[String], flag_value: &str, date: &str) -> String {
    let mut out = String::from("Phone Number,PC Status,Date Completed\n");
    for number in completed {
        out.push_str(&format!("{number},{flag_value},{date}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed() -> Vec<String> {
        vec!["+911111111111".to_string(), "+912222222222".to_string()]
    }

    #[test]
    fn test_crm_import_format() {
        let csv = crm_import_csv(&completed(), "Yes");
        assert_eq!(
            csv,
            "Mobile,PC\n+911111111111,Yes\n+912222222222,Yes\n"
        );
    }

    #[test]
    fn test_crm_import_empty_has_header_only() {
        assert_eq!(crm_import_csv(&[], "Yes"), "Mobile,PC\n");
    }

    #[test]
    fn test_dated_report_format() {
        let csv = render_dated(&completed(), "Yes", "2026-08-05");
        assert_eq!(
            csv,
            "Phone Number,PC Status,Date Completed\n\
             +911111111111,Yes,2026-08-05\n\
             +912222222222,Yes,2026-08-05\n"
        );
    }

    #[test]
    fn test_default_export_paths() {
        assert!(default_export_path(true).starts_with("completed_contacts_"));
        assert!(default_export_path(false).starts_with("crm_import_"));
        assert!(default_export_path(true).ends_with(".csv"));
    }
}
