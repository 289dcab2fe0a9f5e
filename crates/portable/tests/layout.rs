use manos_portable::{STYLE_GUIDE_CSS, normalize_layout};

const LEGACY_TABLE: &str = r#"
<table style="width: 100%; border-collapse: collapse; border: none;">
    <tbody>
        <tr>
            <td style="width: 50%; vertical-align: top; padding: 1rem; border: 1px solid #ccc;">
                <p>Left content...</p>
            </td>
            <td style="width: 50%; vertical-align: top; padding: 1rem;">
                <p>Right content...</p>
            </td>
        </tr>
    </tbody>
</table>
<p><br></p>
"#;

#[test]
fn div_layout_gets_canonical_classes_and_styles() {
    let html = "<div class=\"two-col-container\" style=\"border: 1px solid red\">\
                <div><p>L</p></div><div class=\"two-col-left\"><p>R</p></div></div>";

    assert_eq!(
        normalize_layout(html),
        "<div class=\"two-col-container\" style=\"display: flex; gap: 1rem; width: 100%\">\
         <div class=\"two-col-column two-col-left\" style=\"flex: 1 1 0%; min-width: 0; vertical-align: top\"><p>L</p></div>\
         <div class=\"two-col-column two-col-right\" style=\"flex: 1 1 0%; min-width: 0; vertical-align: top\"><p>R</p></div>\
         </div>"
    );
}

#[test]
fn legacy_table_gets_class_contract_without_borders() {
    let out = normalize_layout(LEGACY_TABLE);

    for class in [
        "class=\"two-col-table\"",
        "class=\"two-col-tbody\"",
        "class=\"two-col-row\"",
        "class=\"two-col-left-td\"",
        "class=\"two-col-right-td\"",
    ] {
        assert_eq!(out.matches(class).count(), 1, "{class}");
    }
    assert!(!out.contains("border:"));
    assert!(out.contains("style=\"width: 100%; border-collapse: collapse\""));
    assert!(out.contains("style=\"width: 50%; vertical-align: top; padding: 1rem\""));
}

#[test]
fn normalizing_twice_changes_nothing() {
    let inputs = [
        LEGACY_TABLE,
        "<div class=\"two-col-container\"><div class=\"two-col-column two-col-right\">a</div>\
         <div class=\"two-col-column\"><div class=\"two-col-container\"><div>x</div><div>y</div></div></div></div>",
        "<p>No layout here</p>",
        "",
        "<table class=\"two-col-table\"><tr><td>a</td></tr><tr><td>b</td><td>c</td><td>d</td></tr></table>",
    ];
    for html in inputs {
        let once = normalize_layout(html);
        assert_eq!(normalize_layout(&once), once, "{html}");
    }
}

#[test]
fn nested_layouts_are_normalized() {
    let out = normalize_layout(
        "<div class=\"two-col-container\"><div><div class=\"two-col-container\"><div>x</div><div>y</div></div></div><div>z</div></div>",
    );
    assert_eq!(out.matches("two-col-left").count(), 2);
    assert_eq!(out.matches("two-col-right").count(), 2);
}

#[test]
fn unrelated_tables_are_left_alone() {
    let table = "<table><tbody><tr><td>a</td><td>b</td><td>c</td></tr></tbody></table>";
    assert_eq!(normalize_layout(table), table);
}

#[test]
fn style_guide_covers_every_layout_class() {
    for class in [
        ".two-col-container",
        ".two-col-column",
        ".two-col-table",
        ".two-col-tbody",
        ".two-col-row",
        ".two-col-left-td",
        ".two-col-right-td",
    ] {
        assert!(STYLE_GUIDE_CSS.contains(class), "{class}");
    }
}
