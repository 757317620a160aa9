//! Property tests for well-formed HTML truncation

use kodegen_tools_authdetect::utils::truncate_html;
use proptest::prelude::*;
use regex::Regex;

const CONTAINERS: [&str; 4] = ["div", "form", "span", "button"];

fn fragment() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-zé ]{0,8}",
        Just("<br>".to_string()),
        Just("<input type=\"email\" placeholder=\"a>b\">".to_string()),
        Just("<!-- <div> -->".to_string()),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop::sample::select(CONTAINERS.to_vec()),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat()))
    })
}

/// Container tags must nest and close in order
fn is_balanced(html: &str) -> bool {
    let without_comments = Regex::new(r"<!--.*?-->").unwrap().replace_all(html, "");
    let tags = Regex::new(r"<(/?)(div|form|span|button)>").unwrap();
    let mut stack = Vec::new();
    for cap in tags.captures_iter(&without_comments) {
        let name = cap[2].to_string();
        if cap[1].is_empty() {
            stack.push(name);
        } else if stack.pop().as_deref() != Some(name.as_str()) {
            return false;
        }
    }
    stack.is_empty()
}

fn text_of(html: &str) -> String {
    let without_comments = Regex::new(r"<!--.*?-->").unwrap().replace_all(html, "");
    Regex::new(r#"<(?:[^>"]|"[^"]*")*>"#)
        .unwrap()
        .replace_all(&without_comments, "")
        .into_owned()
}

proptest! {
    #[test]
    fn prop_output_is_balanced(html in fragment(), max in 0usize..200) {
        let out = truncate_html(&html, max);
        prop_assert!(is_balanced(&out), "unbalanced: {out}");
    }

    #[test]
    fn prop_text_is_a_prefix(html in fragment(), max in 0usize..200) {
        let out = truncate_html(&html, max);
        let kept = text_of(&out);
        prop_assert!(text_of(&html).starts_with(&kept), "{kept:?} not a prefix");
        prop_assert!(kept.chars().count() <= max);
    }

    #[test]
    fn prop_fitting_input_is_untouched(html in fragment()) {
        let max = html.chars().count();
        prop_assert_eq!(truncate_html(&html, max), html);
    }
}

#[test]
fn test_login_form_keeps_leading_fields() {
    let form = format!(
        "<form action=\"/login\"><input type=\"email\" name=\"email\"><input type=\"password\" name=\"password\"><p>{}</p><button>Sign in</button></form>",
        "x".repeat(2000)
    );
    let out = truncate_html(&form, 1500);

    assert!(out.starts_with("<form action=\"/login\"><input type=\"email\""));
    assert!(out.contains("type=\"password\""));
    assert!(out.ends_with("</p></form>"));
    assert!(!out.contains("<button>"));
}
