use crate::entities::PixKeyType;
use regex::Regex;

/// 按键形状分类 Pix key（仅用于审计与展示，不决定能否提现）
///
/// 判定顺序很重要：11位纯数字先当 CPF，带 +55 前缀的才是手机号
pub fn detect_pix_key_type(key: &str) -> PixKeyType {
    let cpf = Regex::new(r"^\d{11}$").unwrap();
    let cnpj = Regex::new(r"^\d{14}$").unwrap();
    let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    let phone = Regex::new(r"^\+\d{12,14}$").unwrap();
    let evp = Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .unwrap();

    let key = key.trim();

    if cpf.is_match(key) {
        PixKeyType::Cpf
    } else if cnpj.is_match(key) {
        PixKeyType::Cnpj
    } else if email.is_match(key) {
        PixKeyType::Email
    } else if phone.is_match(key) {
        PixKeyType::Phone
    } else if evp.is_match(key) {
        PixKeyType::Random
    } else {
        // 未匹配的键按随机键（EVP）对待
        PixKeyType::Random
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_email_key() {
        assert_eq!(detect_pix_key_type("user@example.com"), PixKeyType::Email);
    }

    #[test]
    fn test_detect_cpf_key() {
        assert_eq!(detect_pix_key_type("12345678901"), PixKeyType::Cpf);
    }

    #[test]
    fn test_detect_cnpj_key() {
        assert_eq!(detect_pix_key_type("12345678000195"), PixKeyType::Cnpj);
    }

    #[test]
    fn test_detect_phone_key() {
        assert_eq!(detect_pix_key_type("+5511999998888"), PixKeyType::Phone);
    }

    #[test]
    fn test_detect_random_key() {
        assert_eq!(
            detect_pix_key_type("123e4567-e89b-42d3-a456-426614174000"),
            PixKeyType::Random
        );
    }

    #[test]
    fn test_cpf_wins_over_phone_for_bare_digits() {
        // 11位裸数字是 CPF，不是手机号
        assert_ne!(detect_pix_key_type("12345678901"), PixKeyType::Phone);
    }
}
