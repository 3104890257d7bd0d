use regex::Regex;
use std::sync::LazyLock;

/// Arquivos exportados pelos coletores: qualquer nome com extensão .csv
/// i: case-insensitive
pub static REGEX_SEARCH_CSV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.+\.csv$").unwrap());

/// Linhas de cabeçalho embutidas no meio do arquivo ("Date", "DATE", "Read date", ...)
pub static RE_CABECALHO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)date").unwrap());

// Regex para limpeza e validação
pub static RE_SOMENTE_DIGITOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
pub static RE_CARACTERES_ABA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]:*?/\\]").unwrap());
