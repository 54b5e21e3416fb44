//! Channel-descriptor templating (§4.2 step 2).
//!
//! Three template forms must be supported:
//! - a template containing the substring `{phone}` — substitute directly;
//! - a `PREFIX/SUFFIX` form — split on the first `/` and interpolate as
//!   `PREFIX/phone@SUFFIX`;
//! - a bare prefix — append `/phone`.

pub fn build_channel_descriptor(template: &str, phone: &str) -> String {
    if template.contains("{phone}") {
        return template.replace("{phone}", phone);
    }
    match template.split_once('/') {
        Some((prefix, suffix)) if !suffix.is_empty() => format!("{prefix}/{phone}@{suffix}"),
        _ => format!("{template}/{phone}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_phone_placeholder() {
        assert_eq!(build_channel_descriptor("PJSIP/{phone}@trunk", "+15550001"), "PJSIP/+15550001@trunk");
    }

    #[test]
    fn splits_prefix_suffix_form() {
        assert_eq!(build_channel_descriptor("SIP/trunk1", "+15550001"), "SIP/+15550001@trunk1");
    }

    #[test]
    fn appends_phone_to_bare_prefix() {
        assert_eq!(build_channel_descriptor("PJSIP", "+15550001"), "PJSIP/+15550001");
    }
}
