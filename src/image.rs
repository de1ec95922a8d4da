//! Image provider: remote pulls and derived image synthesis.
//!
//! An [`ImageSource`] names a container image one of two ways:
//!
//! - **Remote**: a registry reference pulled verbatim (`alpine:3.18`).
//! - **Derived**: a base image plus an ordered list of `RUN` steps,
//!   synthesized through a generated Dockerfile.
//!
//! Derived images are deterministic functions of their instructions: the
//! tag is content-addressed from the base reference and steps, so
//! resolving the same instructions twice reuses the image the daemon
//! already has instead of building again.

use crate::constants::{IMAGE_REF_VALID_CHARS, MAX_IMAGE_REF_LEN};
use crate::error::{Error, Result};
use crate::runtime::ContainerRuntime;
use sha2::{Digest, Sha256};
use tracing::debug;

// =============================================================================
// Dockerfile Builder
// =============================================================================

/// Minimal Dockerfile builder: one `FROM`, ordered `RUN` steps.
///
/// Rendering is purely textual; the daemon does the actual build.
#[derive(Debug, Clone)]
pub struct DockerfileBuilder {
    lines: Vec<String>,
}

impl DockerfileBuilder {
    /// Starts a Dockerfile from `base`.
    pub fn from_image(base: &str) -> Self {
        Self {
            lines: vec![format!("FROM {}", base)],
        }
    }

    /// Appends a `RUN` step.
    pub fn run(mut self, step: &str) -> Self {
        self.lines.push(format!("RUN {}", step));
        self
    }

    /// Renders the Dockerfile text.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

// =============================================================================
// Image Sources
// =============================================================================

/// A remote image pulled verbatim from a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    reference: String,
}

/// An image synthesized from a base plus generated instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedImage {
    repository: String,
    base: String,
    steps: Vec<String>,
}

impl DerivedImage {
    /// Content-addressed tag: identical instructions hash to the
    /// identical tag, which is what makes synthesis cacheable.
    fn content_tag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.base.as_bytes());
        for step in &self.steps {
            hasher.update(b"\n");
            hasher.update(step.as_bytes());
        }
        let digest = hex::encode(hasher.finalize());
        digest[..12].to_string()
    }

    /// Local reference the built image is tagged with.
    pub fn local_reference(&self) -> String {
        format!("{}:{}", self.repository, self.content_tag())
    }

    /// Renders the Dockerfile for this image.
    pub fn dockerfile(&self) -> String {
        let mut builder = DockerfileBuilder::from_image(&self.base);
        for step in &self.steps {
            builder = builder.run(step);
        }
        builder.render()
    }
}

/// Identity of a container image: pulled remote or synthesized derived.
///
/// Immutable once constructed; `resolve` is the only operation and is
/// idempotent for both variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(RemoteImage),
    Derived(DerivedImage),
}

impl ImageSource {
    /// A remote image reference, e.g. `gaiadocker/iproute2:3.3`.
    pub fn remote(reference: impl Into<String>) -> Self {
        Self::Remote(RemoteImage {
            reference: reference.into(),
        })
    }

    /// A derived image: `repository` names the build target, `base` the
    /// parent image, `steps` the ordered `RUN` instructions.
    pub fn derived(
        repository: impl Into<String>,
        base: impl Into<String>,
        steps: Vec<String>,
    ) -> Self {
        Self::Derived(DerivedImage {
            repository: repository.into(),
            base: base.into(),
            steps,
        })
    }

    /// Reference this source resolves to locally.
    pub fn reference(&self) -> String {
        match self {
            Self::Remote(remote) => remote.reference.clone(),
            Self::Derived(derived) => derived.local_reference(),
        }
    }

    /// Resolves this source to a locally available image and returns its
    /// reference.
    ///
    /// Remote references are pulled only when absent; derived images are
    /// built only when their content tag is absent, so repeated calls
    /// with identical instructions never duplicate work.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidImageReference`] for malformed references
    /// - [`Error::ImagePull`] when the registry pull fails
    /// - [`Error::ImageBuild`] when derived synthesis fails
    pub async fn resolve(&self, runtime: &dyn ContainerRuntime) -> Result<String> {
        let reference = self.reference();
        validate_reference(&reference)?;

        if runtime.image_exists(&reference).await? {
            debug!("image {} already present, skipping acquire", reference);
            return Ok(reference);
        }

        match self {
            Self::Remote(_) => runtime.pull_image(&reference).await?,
            Self::Derived(derived) => {
                runtime.build_image(&reference, &derived.dockerfile()).await?
            }
        }
        Ok(reference)
    }
}

fn validate_reference(reference: &str) -> Result<()> {
    if reference.is_empty() {
        return Err(Error::InvalidImageReference {
            reference: reference.to_string(),
            reason: "empty image reference".to_string(),
        });
    }
    if reference.len() > MAX_IMAGE_REF_LEN {
        return Err(Error::InvalidImageReference {
            reference: reference.chars().take(50).collect::<String>() + "...",
            reason: format!("exceeds maximum length of {} bytes", MAX_IMAGE_REF_LEN),
        });
    }
    if !reference.chars().all(|c| IMAGE_REF_VALID_CHARS.contains(c)) {
        return Err(Error::InvalidImageReference {
            reference: reference.to_string(),
            reason: "contains invalid characters".to_string(),
        });
    }
    Ok(())
}
