//! Model prompt for authentication detection

use std::fmt::Write as _;

/// Build the text half of the multimodal request
#[must_use]
pub fn build_prompt(url: &str, excerpt: &str, has_screenshot: bool) -> String {
    let mut prompt = String::with_capacity(excerpt.len() + 3_000);

    prompt.push_str(
        "You are analyzing a web page to find the authentication mechanisms it offers.\n",
    );
    let _ = writeln!(prompt, "Page URL: {url}");
    if has_screenshot {
        prompt.push_str("A screenshot of the rendered page is attached. Use it together with the HTML.\n");
    }

    prompt.push_str(
        r#"
Report each mechanism as one component with one of these types:
- "traditional": a username/email plus password form.
- "oauth": sign-in through an EXTERNAL identity provider only (Google, GitHub, Microsoft, Apple, Facebook, Twitter, SSO providers). A site's own "Sign in" button is NOT oauth.
- "passwordless": magic link, one-time code (OTP), passkey/WebAuthn, or SMS code without a password.

Locator guidance for details.locator:
- Prefer visible text over CSS classes, e.g. text="Sign in with Google" or button:has-text("Continue").
- When several providers share a container, give ONE locator for the parent container.
- Plain CSS selectors are accepted, e.g. form#login or form:has(input[type="password"]).
- Always give a best-effort locator, even when unsure.

Respond with JSON only, exactly in this shape:
{"found": true, "components": [{"type": "traditional|oauth|passwordless", "details": {"fields": ["email", "password"], "providers": ["google"], "method": "magic_link|otp|passkey|sms", "locator": "text=\"Sign in\"", "note": "short observation"}}]}

Omit detail keys that do not apply. If the page offers no authentication, respond with {"found": false, "components": []}.

HTML excerpt:
"#,
    );
    prompt.push_str(excerpt);
    prompt
}
