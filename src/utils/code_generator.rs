use rand::Rng;

/// 推荐码字符集：去掉易混淆的 0/O/1/I
const REFERRAL_CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERRAL_CODE_LEN: usize = 8;

/// 生成8位推荐码（唯一性由数据库唯一索引兜底，调用方需重试冲突）
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERRAL_CODE_CHARSET.len());
            REFERRAL_CODE_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(
            code.chars()
                .all(|c| REFERRAL_CODE_CHARSET.contains(&(c as u8)))
        );
    }

    #[test]
    fn test_generate_referral_code_no_confusable_chars() {
        for _ in 0..50 {
            let code = generate_referral_code();
            assert!(!code.contains('0'));
            assert!(!code.contains('O'));
            assert!(!code.contains('1'));
            assert!(!code.contains('I'));
        }
    }
}
