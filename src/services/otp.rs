use data_encoding::BASE32;

/// ワンタイムコードの長さ
pub const CODE_LEN: usize = 8;

/// メール認証・アカウント回復用のワンタイムコードを生成する。
///
/// 20バイトの乱数を base32 エンコードして先頭8文字に切り詰める
/// （旧実装の `generateSecret().base32.substring(0, 8)` と同じ形）。
/// コードは検索キーにしないため衝突処理は不要。
pub fn generate_code() -> String {
    let mut bytes = [0u8; 20];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    BASE32.encode(&bytes)[..CODE_LEN].to_string()
}
