//! PNG rendering of storefront QR codes.
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Luma};
use qrcode::QrCode;
use tracing::debug;

use crate::errors::{ServiceError, ServiceResult};

/// Smallest edge of a rendered code, in pixels.
const MIN_EDGE: u32 = 300;

pub fn render_png(url: &str) -> ServiceResult<Vec<u8>> {
    let code = QrCode::new(url.as_bytes()).map_err(|e| ServiceError::Validation(format!("qr encode: {e}")))?;
    let img = code.render::<Luma<u8>>().min_dimensions(MIN_EDGE, MIN_EDGE).build();
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ServiceError::Db(format!("qr png: {e}")))?;
    Ok(buf.into_inner())
}

pub fn png_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{code}.png"))
}

/// Render `url` and store it as `{dir}/{code}.png`.
pub async fn write_png(dir: &Path, code: &str, url: &str) -> ServiceResult<Vec<u8>> {
    let bytes = render_png(url)?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ServiceError::Db(format!("create {}: {e}", dir.display())))?;
    let path = png_path(dir, code);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ServiceError::Db(format!("write {}: {e}", path.display())))?;
    debug!(path = %path.display(), size = bytes.len(), "qr png written");
    Ok(bytes)
}
