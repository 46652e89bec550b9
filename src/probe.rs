//! Image probing - resolves an image reference to its natural pixel size
//!
//! A probe fetches and decodes just enough of the image to read its
//! dimensions. It reports success or failure once and never retries; callers
//! log failures and keep whatever they were showing before.

use crate::metrics::ImageDimensions;
use async_trait::async_trait;
use std::fmt;
use crate::constants::probe::MAX_RESPONSE_BYTES;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

/// Opaque, equality-comparable token naming an image resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    /// `None` for a missing or empty value, which means "nothing to show"
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            Some(v) if !v.is_empty() => Some(Self(v.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a probe could not produce dimensions
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("image not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image reports a zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("probe task failed: {0}")]
    TaskFailed(String),
}

/// Asynchronous dimension lookup for an image reference
#[async_trait(?Send)]
pub trait ImageProbe {
    async fn probe(&self, reference: &ImageReference) -> Result<ImageDimensions, ProbeError>;

    /// Where the reference resolves to, for log messages
    fn describe(&self, reference: &ImageReference) -> String {
        reference.to_string()
    }
}

fn dimensions_from(width: u32, height: u32) -> Result<ImageDimensions, ProbeError> {
    ImageDimensions::new(width, height).ok_or(ProbeError::ZeroDimension { width, height })
}

/// Reads images from the host's input folder on the local filesystem
#[derive(Debug, Clone)]
pub struct InputDirProbe {
    root: PathBuf,
}

impl InputDirProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a reference below the input folder; anything escaping it is not found
    pub fn resolve(&self, reference: &ImageReference) -> Result<PathBuf, ProbeError> {
        let relative = Path::new(reference.as_str());
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            return Err(ProbeError::NotFound(relative.to_path_buf()));
        }

        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(ProbeError::NotFound(path));
        }
        Ok(path)
    }
}

fn read_file_dimensions(path: &Path) -> Result<ImageDimensions, ProbeError> {
    let reader = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let (width, height) = reader.into_dimensions()?;
    dimensions_from(width, height)
}

#[async_trait(?Send)]
impl ImageProbe for InputDirProbe {
    async fn probe(&self, reference: &ImageReference) -> Result<ImageDimensions, ProbeError> {
        let path = self.resolve(reference)?;
        tokio::task::spawn_blocking(move || read_file_dimensions(&path))
            .await
            .map_err(|e| ProbeError::TaskFailed(e.to_string()))?
    }

    fn describe(&self, reference: &ImageReference) -> String {
        self.root.join(reference.as_str()).display().to_string()
    }
}

/// Fetches images from the host's `/view` endpoint
#[derive(Debug, Clone)]
pub struct HttpProbe {
    base_url: String,
    /// Largest response body read before giving up
    response_limit: u64,
}

impl HttpProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            response_limit: MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_response_limit(mut self, bytes: u64) -> Self {
        self.response_limit = bytes;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/view", self.base_url)
    }
}

fn fetch_dimensions(url: &str, filename: &str, limit: u64) -> Result<ImageDimensions, ProbeError> {
    let http_error = |message: String| ProbeError::Http {
        url: url.to_string(),
        message,
    };

    let response = ureq::get(url)
        .query("filename", filename)
        .query("type", "input")
        .query("subfolder", "")
        .call()
        .map_err(|e| http_error(e.to_string()))?;

    let bytes = response
        .into_body()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| http_error(e.to_string()))?;

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| http_error(e.to_string()))?;
    let (width, height) = reader.into_dimensions()?;
    dimensions_from(width, height)
}

#[async_trait(?Send)]
impl ImageProbe for HttpProbe {
    async fn probe(&self, reference: &ImageReference) -> Result<ImageDimensions, ProbeError> {
        let url = self.endpoint();
        let filename = reference.as_str().to_string();
        let limit = self.response_limit;
        tokio::task::spawn_blocking(move || fetch_dimensions(&url, &filename, limit))
            .await
            .map_err(|e| ProbeError::TaskFailed(e.to_string()))?
    }

    fn describe(&self, reference: &ImageReference) -> String {
        format!(
            "{}?filename={}&type=input&subfolder=",
            self.endpoint(),
            reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::TempDir;

    fn reference(value: &str) -> ImageReference {
        ImageReference::parse(Some(value)).unwrap()
    }

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) {
        image::RgbImage::new(width, height)
            .save(dir.path().join(name))
            .unwrap();
    }

    #[test]
    fn test_empty_reference_is_nothing_to_show() {
        assert_eq!(ImageReference::parse(None), None);
        assert_eq!(ImageReference::parse(Some("")), None);
        assert_eq!(reference("a.png").as_str(), "a.png");
    }

    #[tokio::test]
    async fn test_input_dir_probe_reads_dimensions() {
        let dir = TempDir::new().unwrap();
        write_png(&dir, "wide.png", 64, 32);

        let probe = InputDirProbe::new(dir.path());
        let dims = probe.probe(&reference("wide.png")).await.unwrap();
        assert_eq!((dims.width(), dims.height()), (64, 32));
    }

    #[tokio::test]
    async fn test_input_dir_probe_subfolder() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("shots")).unwrap();
        write_png(&dir, "shots/tall.png", 10, 40);

        let probe = InputDirProbe::new(dir.path());
        let dims = probe.probe(&reference("shots/tall.png")).await.unwrap();
        assert_eq!((dims.width(), dims.height()), (10, 40));
    }

    #[tokio::test]
    async fn test_input_dir_probe_missing_file() {
        let dir = TempDir::new().unwrap();
        let probe = InputDirProbe::new(dir.path());
        let err = probe.probe(&reference("missing.png")).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_input_dir_probe_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let probe = InputDirProbe::new(dir.path());
        let err = probe.probe(&reference("../secret.png")).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_input_dir_probe_undecodable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();

        let probe = InputDirProbe::new(dir.path());
        let err = probe.probe(&reference("broken.png")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));
    }

    #[test]
    fn test_http_probe_describes_view_url() {
        let probe = HttpProbe::new("http://127.0.0.1:8188/");
        assert_eq!(
            probe.describe(&reference("cat.png")),
            "http://127.0.0.1:8188/view?filename=cat.png&type=input&subfolder="
        );
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    /// Answer a single request with `body`; returns the base URL
    fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_view_reads_dimensions() {
        let url = serve_once(png_bytes(48, 16));
        let dims = HttpProbe::new(url).probe(&reference("cat.png")).await.unwrap();
        assert_eq!((dims.width(), dims.height()), (48, 16));
    }

    #[tokio::test]
    async fn test_http_response_limit_is_enforced() {
        let body = png_bytes(48, 16);
        assert!(body.len() > 16);
        let url = serve_once(body);

        let err = HttpProbe::new(url)
            .with_response_limit(16)
            .probe(&reference("cat.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Http { .. }));
    }
}
