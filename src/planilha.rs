use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::{iter, path::Path};
use tracing::debug;

use crate::{
    COLUNA_PESO, Celula, FORMATO_PESO, InventarioError, InventarioResult, MAX_NOME_ABA,
    RE_CARACTERES_ABA, Tabela,
};

/// Largura máxima de coluna aceita pelo Excel
const LARGURA_MAXIMA: usize = 255;

/// Aba lida de uma planilha: nome e linhas brutas (cabeçalho incluído).
#[derive(Debug, Clone, PartialEq)]
pub struct Aba {
    pub nome: String,
    pub linhas: Vec<Vec<Celula>>,
}

impl Aba {
    /// A primeira linha é o cabeçalho; os dados começam em `inicio_dados`.
    ///
    /// Linhas totalmente vazias são ignoradas.
    pub fn into_tabela(self, inicio_dados: usize) -> Tabela {
        let mut linhas = self.linhas.into_iter();

        let colunas: Vec<String> = linhas
            .next()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(j, celula)| match celula {
                Celula::Vazia => format!("Unnamed: {j}"),
                outra => outra.to_string(),
            })
            .collect();

        let mut tabela = Tabela::new(&colunas);

        linhas
            .skip(inicio_dados.saturating_sub(1))
            .filter(|linha| !linha.iter().all(Celula::is_vazia))
            .for_each(|linha| tabela.push_linha(linha));

        tabela
    }
}

/// Nome de aba válido: sem `[]:*?/\`, sem apóstrofos nas pontas,
/// com no máximo 31 caracteres.
///
/// ### Exemplo
/// ```
/// use conversor_inventario::nome_de_aba;
///
/// assert_eq!(nome_de_aba("Galpão 3 [setor A]"), "Galpão 3 _setor A_");
/// assert_eq!(nome_de_aba(&"x".repeat(40)).chars().count(), 31);
/// ```
pub fn nome_de_aba(base: &str) -> String {
    let limpo = RE_CARACTERES_ABA.replace_all(base, "_");
    let nome: String = limpo
        .trim_matches('\'')
        .chars()
        .take(MAX_NOME_ABA)
        .collect();

    if nome.trim().is_empty() {
        "Planilha".to_string()
    } else {
        nome
    }
}

/// Largura de cada coluna: maior texto (cabeçalho incluído) + 2 caracteres.
pub fn larguras_das_colunas(tabela: &Tabela) -> Vec<f64> {
    tabela
        .colunas()
        .iter()
        .enumerate()
        .map(|(j, nome)| {
            let maior = tabela
                .linhas()
                .iter()
                .map(|linha| linha[j].largura())
                .chain(iter::once(nome.chars().count()))
                .max()
                .unwrap_or_default();

            // Limitado ao máximo do Excel; cabe em u8 sem perda
            let largura = u8::try_from((maior + 2).min(LARGURA_MAXIMA)).unwrap_or(u8::MAX);
            f64::from(largura)
        })
        .collect()
}

/// Grava uma planilha com uma aba por tabela, na ordem recebida.
pub fn escrever_planilha(path: &Path, abas: &[(&str, &Tabela)]) -> InventarioResult<()> {
    let mut workbook = Workbook::new();

    let formato_cabecalho = Format::new().set_bold();
    let formato_peso = Format::new().set_num_format(FORMATO_PESO);

    for (nome, tabela) in abas {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*nome)?;
        escrever_aba(worksheet, tabela, &formato_cabecalho, &formato_peso)?;

        debug!(
            "Aba <{nome}> com {} linhas gravada em <{}>",
            tabela.len(),
            path.display()
        );
    }

    workbook.save(path)?;
    Ok(())
}

fn escrever_aba(
    worksheet: &mut Worksheet,
    tabela: &Tabela,
    formato_cabecalho: &Format,
    formato_peso: &Format,
) -> InventarioResult<()> {
    let idx_peso = tabela.indice_coluna(COLUNA_PESO);

    // 1. Cabeçalho
    for (j, nome) in tabela.colunas().iter().enumerate() {
        worksheet.write_string_with_format(0, indice_coluna(j)?, nome, formato_cabecalho)?;
    }

    // 2. Dados: o lote e os marcadores de erro são gravados como texto
    for (i, linha) in tabela.linhas().iter().enumerate() {
        let row = indice_linha(i + 1)?;

        for (j, celula) in linha.iter().enumerate() {
            let col = indice_coluna(j)?;
            match celula {
                Celula::Vazia => {}
                Celula::Texto(texto) => {
                    worksheet.write_string(row, col, texto)?;
                }
                Celula::Numero(n) if Some(j) == idx_peso => {
                    worksheet.write_number_with_format(row, col, *n, formato_peso)?;
                }
                Celula::Numero(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
            }
        }
    }

    // 3. Largura das colunas
    for (j, largura) in larguras_das_colunas(tabela).into_iter().enumerate() {
        worksheet.set_column_width(indice_coluna(j)?, largura)?;
    }

    Ok(())
}

fn indice_linha(i: usize) -> InventarioResult<u32> {
    u32::try_from(i).map_err(|_| InventarioError::LimitePlanilha(format!("linha {i}")))
}

fn indice_coluna(j: usize) -> InventarioResult<u16> {
    u16::try_from(j).map_err(|_| InventarioError::LimitePlanilha(format!("coluna {j}")))
}

/// Lê todas as abas de uma planilha, na ordem em que aparecem.
///
/// As posições são preservadas: a célula A1 é sempre `linhas[0][0]`.
pub fn ler_planilha(path: &Path) -> InventarioResult<Vec<Aba>> {
    let mut workbook = open_workbook_auto(path)?;
    let nomes = workbook.sheet_names().to_owned();

    if nomes.is_empty() {
        return Err(InventarioError::PlanilhaSemAbas {
            arquivo: path.to_path_buf(),
        });
    }

    let mut abas = Vec::with_capacity(nomes.len());

    for nome in nomes {
        let range = workbook.worksheet_range(&nome)?;

        // O range começa na primeira célula preenchida
        let (linha0, coluna0) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or_default();

        let mut linhas: Vec<Vec<Celula>> = vec![Vec::new(); linha0];
        linhas.extend(range.rows().map(|row| {
            iter::repeat_n(Celula::Vazia, coluna0)
                .chain(row.iter().map(celula_de_dado))
                .collect()
        }));

        abas.push(Aba { nome, linhas });
    }

    Ok(abas)
}

fn celula_de_dado(dado: &Data) -> Celula {
    match dado {
        Data::Empty => Celula::Vazia,
        Data::String(s) => Celula::Texto(s.clone()),
        Data::Float(f) => Celula::Numero(*f),
        Data::Int(i) => Celula::Numero(*i as f64),
        outro => Celula::Texto(outro.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tabela_exemplo() -> Tabela {
        let mut t = Tabela::new(&["Lote", "Peso", "Obs"]);
        t.push_linha(vec![
            Celula::texto("000123"),
            Celula::Numero(1.5),
            Celula::Vazia,
        ]);
        t.push_linha(vec![
            Celula::texto("erro QR/-"),
            Celula::texto("erro QR/-"),
            Celula::texto("conferir"),
        ]);
        t
    }

    #[test]
    fn escrever_e_ler_preserva_valores() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("teste.xlsx");
        let tabela = tabela_exemplo();

        escrever_planilha(&path, &[("Dados", &tabela)]).unwrap();
        let abas = ler_planilha(&path).unwrap();

        assert_eq!(abas.len(), 1);
        assert_eq!(abas[0].nome, "Dados");
        assert_eq!(abas[0].linhas[1][0], Celula::texto("000123"));
        assert_eq!(abas[0].linhas[1][1], Celula::Numero(1.5));
        assert_eq!(abas[0].linhas[2][1], Celula::texto("erro QR/-"));

        let lida = abas.into_iter().next().unwrap().into_tabela(1);
        assert_eq!(lida.colunas(), tabela.colunas());
        assert_eq!(lida.len(), 2);
    }

    #[test]
    fn varias_abas_na_ordem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.xlsx");
        let tabela = tabela_exemplo();

        escrever_planilha(&path, &[("B", &tabela), ("A", &tabela)]).unwrap();
        let nomes: Vec<String> = ler_planilha(&path)
            .unwrap()
            .into_iter()
            .map(|aba| aba.nome)
            .collect();

        assert_eq!(nomes, ["B", "A"]);
    }

    #[test]
    fn larguras_consideram_cabecalho_e_celulas() {
        let larguras = larguras_das_colunas(&tabela_exemplo());
        // "erro QR/-" = 9, "Peso" = 4, "conferir" = 8
        assert_eq!(larguras, [11.0, 11.0, 10.0]);
    }

    #[test]
    fn into_tabela_pula_linhas_e_nomeia_colunas_vazias() {
        let aba = Aba {
            nome: "x".to_string(),
            linhas: vec![
                vec![Celula::texto("A"), Celula::Vazia],
                vec![Celula::texto("Date"), Celula::texto("Time")],
                vec![Celula::texto("1"), Celula::texto("2")],
                vec![Celula::Vazia, Celula::Vazia],
            ],
        };

        let tabela = aba.into_tabela(2);
        assert_eq!(tabela.colunas(), ["A", "Unnamed: 1"]);
        assert_eq!(tabela.len(), 1);
        assert_eq!(tabela.linhas()[0][0], Celula::texto("1"));
    }

    #[test]
    fn nome_de_aba_vazio_ou_invalido() {
        assert_eq!(nome_de_aba("'''"), "Planilha");
        assert_eq!(nome_de_aba("a/b:c"), "a_b_c");
    }
}
