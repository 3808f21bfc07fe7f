pub const READY_STATE: &str = "document.readyState";

pub const REF_ATTRIBUTE: &str = "data-grabber-ref";

pub fn escape_js(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Finds the first visible element with the given ARIA role whose accessible
/// name contains `name` (case-insensitive) and tags it with
/// `data-grabber-ref="{marker}"` so it can be resolved as a CSS selector.
pub fn tag_by_role(role: &str, name: &str, marker: &str) -> String {
    let role = escape_js(&role.to_lowercase());
    let name = escape_js(&name.to_lowercase());
    let marker = escape_js(marker);
    format!(
        r#"(function(){{const implicit={{button:'button,input[type=button],input[type=submit]',link:'a[href]',heading:'h1,h2,h3,h4,h5,h6'}};const role='{role}';const sel='[role="'+role+'"]'+(implicit[role]?','+implicit[role]:'');const name='{name}';for(const el of document.querySelectorAll(sel)){{const label=(el.getAttribute('aria-label')||el.textContent||'').trim().toLowerCase();if(!label.includes(name))continue;const style=window.getComputedStyle(el);const rect=el.getBoundingClientRect();if(style.display==='none'||style.visibility==='hidden'||rect.width===0||rect.height===0)continue;el.setAttribute('{attr}','{marker}');return true}}return false}})()"#,
        role = role,
        name = name,
        attr = REF_ATTRIBUTE,
        marker = marker,
    )
}

pub fn ref_selector(marker: &str) -> String {
    format!("[{}=\"{}\"]", REF_ATTRIBUTE, marker)
}

/// Function declaration evaluated with the element bound to `this`.
pub const ELEMENT_ACTIONABLE: &str = r#"function(){const style=window.getComputedStyle(this);const rect=this.getBoundingClientRect();return style.display!=='none'&&style.visibility!=='hidden'&&parseFloat(style.opacity||'1')>0&&rect.width>0&&rect.height>0&&!this.disabled}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_js() {
        assert_eq!(escape_js("div"), "div");
        assert_eq!(escape_js("it's"), "it\\'s");
        assert_eq!(escape_js("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_tag_by_role() {
        let script = tag_by_role("button", "Show Transcript", "ref-1");
        assert!(script.contains("const role='button'"));
        assert!(script.contains("const name='show transcript'"));
        assert!(script.contains("setAttribute('data-grabber-ref','ref-1')"));
    }

    #[test]
    fn test_tag_by_role_escapes_name() {
        let script = tag_by_role("button", "Don't", "m");
        assert!(script.contains("const name='don\\'t'"));
    }

    #[test]
    fn test_ref_selector() {
        assert_eq!(ref_selector("ref-7"), "[data-grabber-ref=\"ref-7\"]");
    }
}
