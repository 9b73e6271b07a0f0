use std::collections::{BTreeSet, HashMap};

use jiff::civil::{Date, date};
use lwgmark_core::{
    E_BAD_NUMBER, E_DUPLICATE_ISSUE, E_IREF_MISSING, E_PAPER_INVALID, E_SREF_SYNTAX,
    E_TAG_MISMATCH, E_TAG_UNCLOSED, ErrorKind, Extractor, Issue, IssueError, LwgStatuses,
    Rewriter, SectionDb, SectionNum, SectionTag, WgSectionLinker,
};

fn issue(num: u32, stat: &str, text: &str) -> Issue {
    Issue {
        num,
        stat: stat.to_string(),
        title: format!("Issue <i>{num}</i>"),
        doc_prefix: None,
        tags: Vec::new(),
        submitter: "Submitter".to_string(),
        date: date(2024, 6, 1),
        mod_date: date(2024, 6, 1),
        priority: None,
        has_resolution: false,
        text: text.to_string(),
        resolution: String::new(),
        duplicates: BTreeSet::new(),
    }
}

fn prepare(issues: &mut [Issue], sections: &mut SectionDb) -> Result<(), IssueError> {
    let mut papers = HashMap::new();
    papers.insert("P1234R2".to_string(), "A paper".to_string());
    let rewriter = Rewriter {
        linker: &WgSectionLinker,
        papers: &papers,
        statuses: &LwgStatuses,
    };
    rewriter.prepare_issues(issues, sections)
}

fn rewrite_one(text: &str) -> Result<String, IssueError> {
    let mut issues = vec![issue(1, "New", text)];
    prepare(&mut issues, &mut SectionDb::new())?;
    Ok(issues.remove(0).text)
}

#[test]
fn duplicate_irefs_link_both_issues() {
    let mut issues = vec![
        issue(20, "Open", "<p>Other.</p>"),
        issue(10, "New", "<duplicate><iref ref=\"20\"/></duplicate>"),
    ];
    prepare(&mut issues, &mut SectionDb::new()).unwrap();

    assert_eq!(issues[0].num, 10);
    assert_eq!(issues[0].text, "");
    assert!(!issues[0].text.contains("iref"));
    assert_eq!(
        issues[0].duplicates.iter().collect::<Vec<_>>(),
        ["<a href=\"lwg-active.html#20\" title=\"Issue 20 (Status: Open)\">20</a>"]
    );
    assert_eq!(
        issues[1].duplicates.iter().collect::<Vec<_>>(),
        ["<a href=\"lwg-active.html#10\" title=\"Issue 10 (Status: New)\">10</a>"]
    );
}

#[test]
fn plain_irefs_link_with_a_snapshot() {
    let mut issues = vec![
        issue(1, "New", "See <iref ref=\"2\"/>."),
        issue(2, "WP", ""),
    ];
    prepare(&mut issues, &mut SectionDb::new()).unwrap();
    assert_eq!(
        issues[0].text,
        "See <a href=\"lwg-defects.html#2\" title=\"Issue 2 (Status: WP)\">2</a>\
         <sup><a href=\"https://cplusplus.github.io/LWG/issue2\" title=\"Latest snapshot\">(i)</a></sup>."
    );
    assert!(issues[1].duplicates.is_empty());
}

#[test]
fn iref_failures() {
    let err = rewrite_one("<iref ref=\"99\"/>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceResolution);
    assert_eq!(err.code, E_IREF_MISSING);
    assert_eq!(err.issue, Some(1));

    let err = rewrite_one("<iref ref=\"ten\"/>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedSource);
    assert_eq!(err.code, E_BAD_NUMBER);
}

#[test]
fn paper_numbers_are_normalized() {
    assert_eq!(
        rewrite_one("<paper num=\"p1234r2\"/>").unwrap(),
        "<a href=\"https://wg21.link/P1234R2\" title=\"A paper\">P1234R2</a>"
    );
    assert_eq!(
        rewrite_one("<paper num='n4950'/>").unwrap(),
        "<a href=\"https://wg21.link/N4950\">N4950</a>"
    );
    assert_eq!(
        rewrite_one("<paper num=\"D2000\"/>").unwrap(),
        "<a href=\"https://wg21.link/D2000\">D2000</a>"
    );
    assert_eq!(
        rewrite_one("<paper num=\"1234\"/>").unwrap(),
        "<a href=\"https://wg21.link/1234\">1234</a>"
    );
}

#[test]
fn invalid_paper_numbers_are_rejected() {
    for number in ["X99", "P12R", "N", "P1234R2x", "R12", "12a"] {
        let err = rewrite_one(&format!("<paper num=\"{number}\"/>")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferenceResolution, "{number}");
        assert_eq!(err.code, E_PAPER_INVALID, "{number}");
        assert_eq!(err.message, format!("Invalid paper number '{number}'"));
    }
}

#[test]
fn section_references_fall_back_to_the_standard() {
    let mut sections = SectionDb::new();
    sections.insert(
        SectionTag::new("", "foo.bar"),
        SectionNum::parse("", "20.1").unwrap(),
    );
    let mut prefixed = issue(5, "New", "<sref ref=\"[foo.bar]\"/>");
    prefixed.doc_prefix = Some("P1234".to_string());
    let mut issues = vec![prefixed];
    prepare(&mut issues, &mut sections).unwrap();

    assert_eq!(
        issues[0].text,
        "20.1 <a href=\"https://wg21.link/foo.bar\">[foo.bar]</a>"
    );
    assert!(!sections.contains(&SectionTag::new("P1234", "foo.bar")));
}

#[test]
fn prefixed_sections_win_when_indexed() {
    let mut sections =
        SectionDb::parse_index("[foo.bar] 20.1\nP1234 [foo.bar] 3.4\n").unwrap();
    let mut prefixed = issue(5, "New", "<sref ref=\"[foo.bar]\"/>");
    prefixed.doc_prefix = Some("P1234".to_string());
    let mut issues = vec![prefixed];
    prepare(&mut issues, &mut sections).unwrap();
    assert_eq!(
        issues[0].text,
        "P1234 3.4 <span class=\"sref\">[foo.bar]</span>"
    );
}

#[test]
fn extracted_prefixed_sections_stay_prefixed() {
    let source = "<issue num=\"7\" status=\"New\">\n\
                  <title>[P1234] Relax foo</title>\n\
                  <section><sref ref=\"[foo.bar]\"/></section>\n\
                  <submitter>A. Person</submitter>\n\
                  <date>2 Feb 2025</date>\n\
                  <discussion><p><sref ref=\"[foo.bar]\"/> <sref ref=\"[un.known]\"/></p></discussion>\n\
                  </issue>\n";
    let mut sections = SectionDb::parse_index("[foo.bar] 16.4.1\n").unwrap();
    sections.register_placeholder(&SectionTag::new("", "un.known"));
    let extractor = Extractor {
        mod_dates: &HashMap::<u32, Date>::new(),
        statuses: &LwgStatuses,
    };
    let extracted = extractor
        .extract(source.to_string(), "issue0007.xml", &mut sections)
        .unwrap();
    assert!(sections.contains(&SectionTag::new("P1234", "foo.bar")));

    let mut issues = vec![extracted.issue];
    prepare(&mut issues, &mut sections).unwrap();
    assert_eq!(
        issues[0].text,
        "<p><b>Discussion:</b></p><p>P1234 ??? <span class=\"sref\">[foo.bar]</span> \
         ??? <a href=\"https://wg21.link/un.known\">[un.known]</a></p>\n"
    );
}

#[test]
fn unknown_sections_get_placeholders() {
    let mut sections = SectionDb::new();
    let mut issues = vec![issue(1, "New", "<sref ref=\"[nowhere]\"/>")];
    prepare(&mut issues, &mut sections).unwrap();
    assert_eq!(
        issues[0].text,
        "??? <a href=\"https://wg21.link/nowhere\">[nowhere]</a>"
    );
    assert!(
        sections
            .get(&SectionTag::new("", "nowhere"))
            .unwrap()
            .is_unresolved()
    );

    let err = rewrite_one("<sref ref=\"nowhere\"/>").unwrap_err();
    assert_eq!(err.code, E_SREF_SYNTAX);
}

#[test]
fn tag_stack_must_balance() {
    assert!(rewrite_one("<ul><li>a</li><li>b</li></ul>").is_ok());

    let err = rewrite_one("<ul><li>a</li></li></ul>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StructuralMismatch);
    assert_eq!(err.code, E_TAG_MISMATCH);

    let err = rewrite_one("<ul><li>a</li>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StructuralMismatch);
    assert_eq!(err.code, E_TAG_UNCLOSED);
    assert_eq!(err.message, "Unclosed tag <ul>");
}

#[test]
fn unclosed_tag_points_at_the_innermost_open_tag() {
    let err = rewrite_one("<p>one</p>\n<ul>\n  <li>two\n</ul>").unwrap_err();
    assert_eq!(err.code, E_TAG_MISMATCH);

    let err = rewrite_one("<p>one</p>\n<div>\n  <b>two</b> <i>three").unwrap_err();
    assert_eq!(err.code, E_TAG_UNCLOSED);
    assert_eq!(err.message, "Unclosed tag <i>");
    let position = err.position.expect("position");
    assert_eq!((position.line, position.character), (2, 13));
    let context = err.context.as_ref().expect("context");
    assert_eq!(context.line, "  <b>two</b> <i>three");
    assert_eq!(context.column, 13);
}

#[test]
fn duplicate_issue_numbers_are_rejected() {
    let mut issues = vec![issue(4, "New", "<p>a</p>"), issue(4, "Open", "<p>b</p>")];
    let err = prepare(&mut issues, &mut SectionDb::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedSource);
    assert_eq!(err.code, E_DUPLICATE_ISSUE);
    assert_eq!(err.issue, Some(4));
}

#[test]
fn mismatch_reports_context() {
    let err = rewrite_one("<p>one</p>\n<p>two</b>\n<p>three</p>").unwrap_err();
    let context = err.context.as_ref().expect("context");
    assert_eq!(context.line, "<p>two</b>");
    assert_eq!(context.column, 6);
    let position = err.position.expect("position");
    assert_eq!((position.line, position.character), (1, 6));
    assert!(err.to_string().starts_with(
        "Mismatched tags. Open tag was <p>, closing tag was </b> in issue 1:\n<p>two</b>\n      ^"
    ));
}

#[test]
fn resolution_buffer_is_rewritten_too() {
    let mut with_resolution = issue(3, "New", "<p>text</p>");
    with_resolution.resolution = "<note>n</note>".to_string();
    let mut issues = vec![with_resolution];
    prepare(&mut issues, &mut SectionDb::new()).unwrap();
    assert_eq!(issues[0].resolution, "<p><i>[n]</i></p>\n");

    let mut broken = issue(3, "New", "<p>text</p>");
    broken.resolution = "<note>n".to_string();
    let err = prepare(&mut [broken], &mut SectionDb::new()).unwrap_err();
    assert_eq!(err.code, E_TAG_UNCLOSED);
}
