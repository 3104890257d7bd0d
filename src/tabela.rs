use std::fmt;

/// Valor de uma célula de planilha.
#[derive(Debug, Clone, PartialEq)]
pub enum Celula {
    Vazia,
    Texto(String),
    Numero(f64),
}

impl Celula {
    pub fn texto(valor: impl Into<String>) -> Self {
        Celula::Texto(valor.into())
    }

    /// Converte qualquer célula em texto (vazia -> "").
    ///
    /// Números inteiros perdem o ".0": `123.0` -> `"123"`.
    pub fn como_texto(&self) -> Celula {
        match self {
            Celula::Texto(_) => self.clone(),
            outra => Celula::Texto(outra.to_string()),
        }
    }

    pub fn is_vazia(&self) -> bool {
        matches!(self, Celula::Vazia)
    }

    /// Número de caracteres exibidos (não de bytes).
    pub fn largura(&self) -> usize {
        match self {
            Celula::Vazia => 0,
            Celula::Texto(s) => s.chars().count(),
            Celula::Numero(n) => n.to_string().chars().count(),
        }
    }
}

impl fmt::Display for Celula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Celula::Vazia => Ok(()),
            Celula::Texto(s) => f.write_str(s),
            Celula::Numero(n) => write!(f, "{n}"),
        }
    }
}

impl From<Option<f64>> for Celula {
    fn from(valor: Option<f64>) -> Self {
        valor.map_or(Celula::Vazia, Celula::Numero)
    }
}

/// Tabela retangular: todas as linhas têm exatamente `colunas.len()` células.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tabela {
    colunas: Vec<String>,
    linhas: Vec<Vec<Celula>>,
}

impl Tabela {
    pub fn new<I, S>(colunas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Tabela {
            colunas: colunas
                .into_iter()
                .map(|c| c.as_ref().to_string())
                .collect(),
            linhas: Vec::new(),
        }
    }

    pub fn colunas(&self) -> &[String] {
        &self.colunas
    }

    pub fn linhas(&self) -> &[Vec<Celula>] {
        &self.linhas
    }

    pub fn len(&self) -> usize {
        self.linhas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linhas.is_empty()
    }

    /// Adiciona uma linha, completando com células vazias (ou truncando)
    /// para manter a tabela retangular.
    pub fn push_linha(&mut self, mut linha: Vec<Celula>) {
        linha.resize(self.colunas.len(), Celula::Vazia);
        self.linhas.push(linha);
    }

    pub fn indice_coluna(&self, nome: &str) -> Option<usize> {
        self.colunas.iter().position(|c| c == nome)
    }

    /// Células de uma coluna, de cima para baixo.
    pub fn coluna(&self, nome: &str) -> Option<impl Iterator<Item = &Celula>> {
        let idx = self.indice_coluna(nome)?;
        Some(self.linhas.iter().map(move |linha| &linha[idx]))
    }

    /// Nova tabela com uma coluna extra de valor constante (procedência).
    pub fn com_procedencia(mut self, coluna: &str, valor: &str) -> Self {
        self.colunas.push(coluna.to_string());
        for linha in &mut self.linhas {
            linha.push(Celula::texto(valor));
        }
        self
    }

    /// Nova tabela com a função aplicada a cada célula da coluna `nome`.
    /// Se a coluna não existir, a tabela é devolvida sem alterações.
    pub fn mapear_coluna<F>(mut self, nome: &str, f: F) -> Self
    where
        F: Fn(&Celula) -> Celula,
    {
        if let Some(idx) = self.indice_coluna(nome) {
            for linha in &mut self.linhas {
                linha[idx] = f(&linha[idx]);
            }
        }
        self
    }

    /// Concatena tabelas linha a linha, alinhando as colunas pelo nome.
    ///
    /// As colunas do resultado são a união das colunas de entrada, na ordem
    /// da primeira ocorrência. Colunas ausentes em uma tabela ficam vazias.
    ///
    /// ### Exemplo
    /// ```
    /// use conversor_inventario::{Celula, Tabela};
    ///
    /// let mut a = Tabela::new(&["Lote", "Peso"]);
    /// a.push_linha(vec![Celula::texto("007"), Celula::Numero(1.5)]);
    ///
    /// let mut b = Tabela::new(&["Peso", "SI"]);
    /// b.push_linha(vec![Celula::Numero(2.0), Celula::texto("X")]);
    ///
    /// let c = Tabela::concatenar(vec![a, b]);
    /// assert_eq!(c.colunas(), ["Lote", "Peso", "SI"]);
    /// assert_eq!(c.len(), 2);
    /// assert_eq!(c.linhas()[1][0], Celula::Vazia);
    /// ```
    pub fn concatenar(tabelas: Vec<Tabela>) -> Tabela {
        // 1. União ordenada dos nomes de colunas
        let mut colunas: Vec<String> = Vec::new();
        for tabela in &tabelas {
            for nome in &tabela.colunas {
                if !colunas.contains(nome) {
                    colunas.push(nome.clone());
                }
            }
        }

        let mut resultado = Tabela {
            colunas,
            linhas: Vec::with_capacity(tabelas.iter().map(Tabela::len).sum()),
        };

        // 2. Reposicionar as células de cada tabela nas colunas do resultado
        for tabela in tabelas {
            let destino: Vec<usize> = tabela
                .colunas
                .iter()
                .filter_map(|nome| resultado.indice_coluna(nome))
                .collect();

            for linha in tabela.linhas {
                let mut nova = vec![Celula::Vazia; resultado.colunas.len()];
                for (celula, &idx) in linha.into_iter().zip(&destino) {
                    nova[idx] = celula;
                }
                resultado.linhas.push(nova);
            }
        }

        resultado
    }

    /// Hash (blake3) dos nomes de colunas e dos valores das células.
    ///
    /// Duas execuções sobre os mesmos arquivos produzem a mesma impressão digital.
    pub fn impressao_digital(&self) -> String {
        let mut hasher = blake3::Hasher::new();

        for nome in &self.colunas {
            hasher.update(nome.as_bytes());
            hasher.update(&[0x1f]);
        }

        for linha in &self.linhas {
            hasher.update(&[0x1e]);
            for celula in linha {
                // O prefixo distingue o texto "1.5" do número 1.5
                let tag: u8 = match celula {
                    Celula::Vazia => b'V',
                    Celula::Texto(_) => b'T',
                    Celula::Numero(_) => b'N',
                };
                hasher.update(&[tag]);
                hasher.update(celula.to_string().as_bytes());
                hasher.update(&[0x1f]);
            }
        }

        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabela_bobina() -> Tabela {
        let mut t = Tabela::new(&["Lote", "Peso"]);
        t.push_linha(vec![Celula::texto("00123"), Celula::Numero(1.5)]);
        t.push_linha(vec![Celula::texto(""), Celula::Vazia]);
        t
    }

    #[test]
    fn push_linha_mantem_tabela_retangular() {
        let mut t = Tabela::new(&["A", "B", "C"]);
        t.push_linha(vec![Celula::texto("x")]);
        t.push_linha(vec![
            Celula::texto("1"),
            Celula::texto("2"),
            Celula::texto("3"),
            Celula::texto("4"),
        ]);

        assert_eq!(t.linhas()[0].len(), 3);
        assert_eq!(t.linhas()[0][2], Celula::Vazia);
        assert_eq!(t.linhas()[1].len(), 3);
    }

    #[test]
    fn com_procedencia_adiciona_coluna_constante() {
        let t = tabela_bobina().com_procedencia("Localização", "Galpao 1");

        assert_eq!(t.colunas().last().map(String::as_str), Some("Localização"));
        assert!(
            t.coluna("Localização")
                .unwrap()
                .all(|c| *c == Celula::texto("Galpao 1"))
        );
    }

    #[test]
    fn concatenar_preserva_total_de_linhas() {
        let a = tabela_bobina().com_procedencia("Localização", "a");
        let b = tabela_bobina().com_procedencia("Localização", "b");
        let c = Tabela::concatenar(vec![a, b]);

        assert_eq!(c.len(), 4);
        assert_eq!(c.colunas(), ["Lote", "Peso", "Localização"]);
        assert_eq!(c.linhas()[2][2], Celula::texto("b"));
    }

    #[test]
    fn como_texto_remove_decimal_de_inteiros() {
        assert_eq!(Celula::Numero(123.0).como_texto(), Celula::texto("123"));
        assert_eq!(Celula::Numero(1.25).como_texto(), Celula::texto("1.25"));
        assert_eq!(Celula::Vazia.como_texto(), Celula::texto(""));
    }

    #[test]
    fn largura_conta_caracteres() {
        assert_eq!(Celula::texto("Localização").largura(), 11);
        assert_eq!(Celula::Numero(0.123).largura(), 5);
    }

    #[test]
    fn impressao_digital_distingue_texto_de_numero() {
        let mut a = Tabela::new(&["Peso"]);
        a.push_linha(vec![Celula::Numero(1.5)]);
        let mut b = Tabela::new(&["Peso"]);
        b.push_linha(vec![Celula::texto("1.5")]);

        assert_ne!(a.impressao_digital(), b.impressao_digital());
        assert_eq!(a.impressao_digital(), a.clone().impressao_digital());
    }
}
