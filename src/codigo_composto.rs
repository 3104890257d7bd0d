use crate::{COLUNAS_PRODUTO_ACABADO, Campo, Celula, ErroLeitura, MIN_CAMPOS_REGISTRO};

/// Separador entre os dois grupos do código composto
const SEPARADOR_DE_GRUPOS: &str = " -";

/// Sub-campos do código composto de "Produto Acabado".
///
/// Formato: `ARMAZEM-LOTE -PESO-SI-NVDT-NVHR[-C8[-C9]]`
#[derive(Debug, Clone, PartialEq)]
pub struct CodigoComposto {
    pub armazem: String,
    pub lote: String,
    /// Em kg (o código traz gramas), arredondado em 3 casas
    pub peso: Option<f64>,
    pub si: String,
    pub nv_dt: String,
    pub nv_hr: String,
    pub coluna_8: Option<String>,
    pub coluna_9: Option<String>,
}

/// Divide o código composto em seus sub-campos.
///
/// O primeiro grupo deve ter exatamente 2 sub-campos e o segundo de 4 a 6.
/// Um peso não numérico não é erro: fica ausente.
///
/// ### Exemplo
/// ```
/// use conversor_inventario::interpretar_codigo;
///
/// let codigo = interpretar_codigo("3-0012345 -1500-A-20240315-1030").unwrap();
///
/// assert_eq!(codigo.armazem, "3");
/// assert_eq!(codigo.lote, "0012345");
/// assert_eq!(codigo.peso, Some(1.5));
/// assert_eq!(codigo.nv_hr, "1030");
/// ```
pub fn interpretar_codigo(codigo: &str) -> Campo<CodigoComposto> {
    let (grupo1, grupo2) = codigo
        .split_once(SEPARADOR_DE_GRUPOS)
        .ok_or(ErroLeitura::CodigoComposto)?;

    let grupo1: Vec<&str> = grupo1.split('-').map(str::trim).collect();
    let grupo2: Vec<&str> = grupo2.split('-').map(str::trim).collect();

    let [armazem, lote] = grupo1.as_slice() else {
        return Err(ErroLeitura::CodigoComposto);
    };

    let (peso, si, nv_dt, nv_hr, cauda) = match grupo2.as_slice() {
        [peso, si, nv_dt, nv_hr, cauda @ ..] if cauda.len() <= 2 => {
            (peso, si, nv_dt, nv_hr, cauda)
        }
        _ => return Err(ErroLeitura::CodigoComposto),
    };

    Ok(CodigoComposto {
        armazem: armazem.to_string(),
        lote: lote.to_string(),
        peso: converter_peso(peso),
        si: si.to_string(),
        nv_dt: nv_dt.to_string(),
        nv_hr: nv_hr.to_string(),
        coluna_8: cauda.first().map(|c| c.to_string()),
        coluna_9: cauda.get(1).map(|c| c.to_string()),
    })
}

/// Gramas -> kg com 3 casas decimais
fn converter_peso(texto: &str) -> Option<f64> {
    let kg = texto.parse::<f64>().ok().filter(|n| n.is_finite())? / 1000.0;
    Some((kg * 1000.0).round() / 1000.0).filter(|n| n.is_finite())
}

/// Linha do fluxo "Produto Acabado" com o código composto já interpretado.
#[derive(Debug, Clone, PartialEq)]
pub struct LinhaProdutoAcabado {
    /// DT Leitura, HR Leitura, Reg, Leitor
    pub cabecalho: [String; 4],
    pub filial: String,
    pub codigo: String,
    pub campos: Campo<CodigoComposto>,
}

impl LinhaProdutoAcabado {
    /// Campos brutos: 0-3 passam direto, 4 é o código composto, 5 é a filial.
    /// Retorna `None` para linhas com menos de 5 campos.
    pub fn from_campos(campos: &[&str]) -> Option<Self> {
        if campos.len() < MIN_CAMPOS_REGISTRO {
            return None;
        }

        let codigo = campos[4].trim();

        Some(LinhaProdutoAcabado {
            cabecalho: [
                campos[0].to_string(),
                campos[1].to_string(),
                campos[2].to_string(),
                campos[3].to_string(),
            ],
            filial: campos.get(5).map(|f| f.to_string()).unwrap_or_default(),
            codigo: codigo.to_string(),
            campos: interpretar_codigo(codigo),
        })
    }

    /// Células na ordem de `COLUNAS_PRODUTO_ACABADO`.
    ///
    /// Um código inválido vira o marcador de erro em todos os sub-campos.
    pub fn into_celulas(self) -> Vec<Celula> {
        let mut celulas: Vec<Celula> = Vec::with_capacity(COLUNAS_PRODUTO_ACABADO.len());

        celulas.extend(self.cabecalho.into_iter().map(Celula::Texto));
        celulas.push(Celula::Texto(self.filial));
        celulas.push(Celula::Texto(self.codigo));

        match self.campos {
            Ok(c) => celulas.extend([
                Celula::Texto(c.armazem),
                Celula::Texto(c.lote),
                Celula::from(c.peso),
                Celula::Texto(c.si),
                Celula::Texto(c.nv_dt),
                Celula::Texto(c.nv_hr),
                c.coluna_8.map_or(Celula::Vazia, Celula::Texto),
                c.coluna_9.map_or(Celula::Vazia, Celula::Texto),
            ]),
            Err(erro) => {
                let marcador = erro.to_string();
                celulas.extend((0..8).map(|_| Celula::texto(marcador.as_str())));
            }
        }

        celulas
    }
}
