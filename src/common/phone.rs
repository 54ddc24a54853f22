// src/common/phone.rs

/// Quantidade de dígitos da forma canônica (número local sem DDI).
const CANONICAL_DIGITS: usize = 10;

/// Normaliza um telefone para a forma canônica usada como identidade.
///
/// Remove tudo que não é dígito e, se sobrar mais de 10 dígitos, mantém
/// apenas os 10 últimos. Assim "+91 98765-43210", "098765 43210" e
/// "9876543210" apontam para o mesmo usuário.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() > CANONICAL_DIGITS {
        digits[digits.len() - CANONICAL_DIGITS..].to_string()
    } else {
        digits
    }
}
