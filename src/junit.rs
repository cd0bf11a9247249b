use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};

use crate::test::TestOutcome;

pub(crate) fn write_junit_xml(outcomes: &[TestOutcome], path: &str) {
    let mut test_cases = Vec::new();

    for o in outcomes {
        let tc = match &o.result {
            Ok(_) => TestCaseBuilder::success(&o.name, Duration::seconds_f64(o.wall_secs)),
            Err(e) => TestCaseBuilder::failure(
                &o.name,
                Duration::seconds_f64(o.wall_secs),
                "failure",
                &format!("{:?}", e),
            ),
        }
        .build();
        test_cases.push(tc);
    }

    let suite_name = crate::CRATE_NAME
        .get()
        .map(String::as_str)
        .unwrap_or(env!("CARGO_PKG_NAME"));
    let test_suite = TestSuiteBuilder::new(suite_name)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create(path).unwrap();
    report.write_xml(file).unwrap();
}
