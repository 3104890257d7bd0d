// --- Nomes de colunas, abas e pastas de trabalho ---

/// Colunas da planilha intermediária do fluxo "Bobina" (nesta ordem)
pub const COLUNAS_BOBINA: [&str; 4] = [
    COLUNA_DATA_LEITURA,
    COLUNA_HORA_LEITURA,
    COLUNA_LOTE,
    COLUNA_PESO,
];

pub const COLUNA_DATA_LEITURA: &str = "Data da Leitura";
pub const COLUNA_HORA_LEITURA: &str = "Hora da Leitura";
pub const COLUNA_LOTE: &str = "Lote";
pub const COLUNA_PESO: &str = "Peso";
pub const COLUNA_ARMAZEM: &str = "Armazem";

/// Colunas da planilha do fluxo "Produto Acabado".
///
/// A coluna `Código` do arquivo bruto é expandida em `Armazem` .. `Coluna 9`.
pub const COLUNAS_PRODUTO_ACABADO: [&str; 14] = [
    "DT Leitura",
    "HR Leitura",
    "Reg",
    "Leitor",
    "Filial",
    "Código",
    COLUNA_ARMAZEM,
    COLUNA_LOTE,
    COLUNA_PESO,
    "SI",
    "NV DT",
    "NV HR",
    "Coluna 8",
    "Coluna 9",
];

/// Coluna de procedência (arquivo de origem) do fluxo "Bobina"
pub const COLUNA_LOCALIZACAO_BOBINA: &str = "Localização";

/// Coluna de procedência (aba de origem) do fluxo "Produto Acabado"
pub const COLUNA_LOCALIZACAO_PRODUTO: &str = "Localizacao";

pub const ABA_DADOS: &str = "Dados";
pub const ABA_INVENTARIO_UNIFICADO: &str = "Inventario_Unificado";
pub const ABA_INVENTARIO_CONSOLIDADO: &str = "Inventario_Consolidado";

/// Limite de caracteres do nome de uma aba de planilha
pub const MAX_NOME_ABA: usize = 31;

pub const PASTA_CSV_ORIGINAL: &str = "csv_original";
pub const PASTA_EXCEL_INTERMEDIARIO: &str = "excel_intermediario";
pub const ARQUIVO_INVENTARIO: &str = "Inventario.xlsx";
pub const ARQUIVO_INVENTARIO_FINAL: &str = "Inventario_Final.xlsx";

/// Formato numérico de exibição da coluna `Peso`
pub const FORMATO_PESO: &str = "0.000";

/// Número mínimo de campos de um registro do coletor
pub const MIN_CAMPOS_REGISTRO: usize = 5;
