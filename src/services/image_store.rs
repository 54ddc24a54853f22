// src/services/image_store.rs

// Imagens de produto gravadas em disco e servidas como arquivos estáticos
// em `/uploads`.

use std::path::PathBuf;

use chrono::Utc;
use rand::Rng;

use crate::common::error::AppError;

/// Tamanho máximo do arquivo (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

const PUBLIC_PREFIX: &str = "/uploads/products/";

/// Tipos aceitos e a extensão gravada para cada um
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
];

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn products_dir(&self) -> PathBuf {
        self.root.join("products")
    }

    /// Valida e grava a imagem. Retorna a URL pública.
    ///
    /// O tipo vem do `Content-Type` da parte; sem ele, é deduzido do nome
    /// do arquivo.
    pub async fn save_product_image(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::invalid("Empty file provided"));
        }
        if data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::invalid(format!(
                "File too large. Maximum size is {}MB",
                MAX_IMAGE_SIZE / 1024 / 1024
            )));
        }

        let mime = content_type
            .map(|c| c.to_ascii_lowercase())
            .or_else(|| {
                file_name
                    .and_then(|name| mime_guess::from_path(name).first())
                    .map(|m| m.essence_str().to_string())
            })
            .unwrap_or_default();

        let extension = ALLOWED_TYPES
            .iter()
            .find(|(allowed, _)| *allowed == mime)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                AppError::invalid("Only image files are allowed (JPEG, PNG, WebP, GIF)")
            })?;

        let dir = self.products_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar diretório de imagens: {}", e))?;

        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let file = format!("product-{}-{}{}", Utc::now().timestamp_millis(), suffix, extension);

        tokio::fs::write(dir.join(&file), data)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao gravar imagem: {}", e))?;

        tracing::info!(file = %file, size = data.len(), "🖼️ Imagem de produto gravada");
        Ok(format!("{PUBLIC_PREFIX}{file}"))
    }

    /// Remove a imagem de uma URL pública. Erros só são logados.
    pub async fn remove(&self, url: &str) {
        let Some(file) = url.strip_prefix(PUBLIC_PREFIX) else {
            return;
        };
        // Só nomes simples, nunca caminhos
        if file.is_empty() || file.contains(['/', '\\']) || file.contains("..") {
            tracing::warn!(url, "URL de imagem ignorada na remoção");
            return;
        }

        match tokio::fs::remove_file(self.products_dir().join(file)).await {
            Ok(()) => tracing::debug!(file, "Imagem removida"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file, "Falha ao remover imagem: {}", e),
        }
    }
}
