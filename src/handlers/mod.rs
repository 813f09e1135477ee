pub mod health;
pub mod login;
pub mod profile;
pub mod recovery;
pub mod register;
pub mod verify;

pub use health::health_check;
pub use login::login;
pub use profile::{change_password, get_profile, update_name};
pub use recovery::{complete_recovery, request_recovery};
pub use register::register;
pub use verify::verify_email;

/// 簡易的なメール形式チェック
///
/// @ がちょうど1つ、ローカル部・ドメイン部が非空、ドメインにドットを含み、
/// 空白を含まないこと。RFC 完全準拠ではなく、明らかな入力ミスの検出が目的。
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email_accepts_plausible_addresses() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("jane.doe+tag@mail.example.org"));
    }

    #[test]
    fn test_is_valid_email_rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("   "));
        assert!(!is_valid_email("invalid-email"));
        // @ は1つだけ
        assert!(!is_valid_email("a@@b"));
        assert!(!is_valid_email("a@b@c.com"));
        // ドメインにドットが必要
        assert!(!is_valid_email("jane@x"));
        // 両端のドットは不可
        assert!(!is_valid_email("jane@.com"));
        assert!(!is_valid_email("jane@x.com."));
        // ローカル部・ドメイン部は非空
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("jane@"));
        // 空白を含む
        assert!(!is_valid_email("jane doe@x.com"));
    }
}
