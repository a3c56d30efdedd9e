use latexcc_log::LogReport;

#[test]
fn test_second_error_is_kept_after_primary() {
    let log = "(./texput.tex\n! Undefined control sequence.\nl.3 \\foo\n\n! Missing $ inserted.\nl.5 x^\n";
    let report = LogReport::from_log(log);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.primary_error().unwrap().line, Some(3));
    assert_eq!(report.errors[1].message, "Missing $ inserted.");
    assert_eq!(report.errors[1].line, Some(5));
}

#[test]
fn test_missing_package_error() {
    let log = "(./texput.tex\n! LaTeX Error: File `nonexistent.sty' not found.\n\nType X to quit or <RETURN> to proceed,\nor enter new name. (Default extension: sty)\n\nEnter file name: \n! Emergency stop.\n<read *> \n\nl.1 \\usepackage{nonexistent}\n";
    let report = LogReport::from_log(log);
    assert!(report.fatal);
    let error = report.primary_error().unwrap();
    assert!(error.message.contains("nonexistent.sty"));
    assert_eq!(error.file.as_deref(), Some("./texput.tex"));
}

#[test]
fn test_report_serializes_without_empty_fields() {
    let report = LogReport::from_log("! Missing number.\n");
    let json = serde_json::to_value(&report).unwrap();
    let error = &json["errors"][0];
    assert_eq!(error["message"], "Missing number.");
    assert!(error.get("file").is_none());
    assert!(error.get("context").is_none());
}

#[test]
fn test_consecutive_file_line_errors() {
    let log = "./texput.tex:2: Undefined control sequence.\n<recently read> \\foo\n./texput.tex:4: Missing $ inserted.\n";
    let report = LogReport::from_log(log);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.errors[0].context, ["<recently read> \\foo"]);
    assert_eq!(report.errors[1].line, Some(4));
}
