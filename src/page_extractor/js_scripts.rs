//! JavaScript evaluation scripts
//!
//! Scripts evaluated in the page. Each returns a plain object so the
//! result deserializes even when the interesting value is null.

/// Document state and resource-timing count, polled for network idle
pub const READINESS_SCRIPT: &str = r#"
    (() => ({
        readyState: document.readyState,
        resourceCount: performance.getEntriesByType('resource').length,
        bodyExists: document.body !== null
    }))()
"#;

/// Serialized open shadow roots, depth-first, each wrapped with its host
pub const SHADOW_DOM_SCRIPT: &str = r#"
    (() => {
        const parts = [];
        const visit = (root) => {
            for (const el of root.querySelectorAll('*')) {
                if (!el.shadowRoot) continue;
                const host = el.tagName.toLowerCase() + (el.id ? '#' + el.id : '');
                parts.push('<div data-shadow-host="' + host + '">' + el.shadowRoot.innerHTML + '</div>');
                visit(el.shadowRoot);
            }
        };
        visit(document);
        return { html: parts.join('\n'), hosts: parts.length };
    })()
"#;

/// Auth-relevant accessibility signals: labelled controls, auth
/// autocomplete tokens and dialog roles
pub const ACCESSIBILITY_SCRIPT: &str = r#"
    (() => {
        const AUTH = /(sign|log)[\s-]?(in|on|up)|login|password|passkey|continue with|account|auth|sso|one[\s-]time|verification code|magic link/i;
        const TOKENS = /(username|current-password|new-password|one-time-code|webauthn)/i;
        const signals = [];
        const seen = new Set();
        const push = (s) => {
            if (signals.length < 50 && !seen.has(s)) {
                seen.add(s);
                signals.push(s);
            }
        };
        const nodes = document.querySelectorAll('[role], [aria-label], [aria-labelledby], [autocomplete], input, button, a');
        for (const el of nodes) {
            const role = el.getAttribute('role') || el.tagName.toLowerCase();
            let name = el.getAttribute('aria-label') || '';
            const labelledBy = el.getAttribute('aria-labelledby');
            if (!name && labelledBy) {
                const label = document.getElementById(labelledBy);
                name = label ? label.textContent : '';
            }
            if (!name && (el.tagName === 'BUTTON' || el.tagName === 'A')) {
                name = el.textContent || '';
            }
            name = name.replace(/\s+/g, ' ').trim().slice(0, 80);
            const autocomplete = el.getAttribute('autocomplete') || '';
            if (TOKENS.test(autocomplete)) {
                push(role + '[autocomplete=' + autocomplete + ']');
            }
            if (name && AUTH.test(name)) {
                push(role + ': ' + name);
            }
            if (role === 'dialog' || el.getAttribute('aria-modal') === 'true') {
                push('dialog' + (name ? ': ' + name : ''));
            }
        }
        return { signals };
    })()
"#;

/// Locator resolution shared by every element query. Defines `__authLocate(loc)`
/// for the serialized `Locator` shapes (`css`, `text`, `hasText`, `has`).
pub const LOCATOR_RUNTIME: &str = r#"
    const __authNorm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const __authQuery = (selector, root) => {
        try {
            return Array.from((root || document).querySelectorAll(selector));
        } catch (e) {
            return [];
        }
    };
    const __authText = (el, text, exact) => {
        const t = __authNorm(el.textContent);
        return exact ? t === text : t.includes(text);
    };
    const __authLocate = (loc) => {
        switch (loc.kind) {
            case 'css':
                return __authQuery(loc.selector)[0] || null;
            case 'text': {
                const text = __authNorm(loc.text);
                for (const el of __authQuery('body *')) {
                    if (['SCRIPT', 'STYLE', 'TITLE'].includes(el.tagName)) continue;
                    if (!__authText(el, text, loc.exact)) continue;
                    if (Array.from(el.children).some((c) => __authText(c, text, loc.exact))) continue;
                    return el.closest('button, a, [role="button"]') || el;
                }
                return null;
            }
            case 'hasText': {
                const text = __authNorm(loc.text);
                return __authQuery(loc.selector).find((el) => __authText(el, text, false)) || null;
            }
            case 'has':
                return __authQuery(loc.selector).find((el) => __authQuery(loc.inner, el).length > 0) || null;
            default:
                return null;
        }
    };
"#;

/// Visibility test for modal detection: attached with a layout box
pub const VISIBILITY_RUNTIME: &str = r#"
    const __authVisible = (el) => {
        if (el.offsetParent !== null) return true;
        const style = getComputedStyle(el);
        return style.position === 'fixed' && style.display !== 'none'
            && style.visibility !== 'hidden' && el.getClientRects().length > 0;
    };
"#;
