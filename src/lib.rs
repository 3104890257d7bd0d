mod args;
mod codigo_composto;
mod error;
mod leitura;
pub mod logging;
mod mesclagem;
mod metadata;
mod normalizador;
mod pipeline;
mod planilha;
mod regex;
mod tabela;
mod terminal;

pub use self::{
    args::*, codigo_composto::*, error::*, leitura::*, mesclagem::*, metadata::*,
    normalizador::*, pipeline::*, planilha::*, regex::*, tabela::*, terminal::*,
};
