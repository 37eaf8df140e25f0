//! # modpox-gitlab
//!
//! Serves the Go module proxy protocol for modules hosted on a private
//! GitLab instance, which knows nothing about Go modules.
//!
//! | Request                 | Synthesized from                              |
//! |-------------------------|-----------------------------------------------|
//! | `/@v/list`              | repository tags, sorted by version            |
//! | `/@latest`              | highest tag, or a pseudo-version of the newest commit |
//! | `/@v/<v>.info`          | commit timestamp of the tag / commit          |
//! | `/@v/<v>.mod`           | `go.mod` at that ref                          |
//! | `/@v/<v>.zip`           | repository archive, re-rooted at `module@v`   |
//!
//! The API token only ever travels over HTTPS to the configured host, see
//! [`TokenTransport`].

pub mod api;
pub mod archive;
mod client;
pub mod key;
pub mod pseudo;
pub mod semver;
mod transport;
mod upstream;

pub use api::{Commit, Project, ProjectApi, Tag};
pub use client::GitLabClient;
pub use transport::TokenTransport;
pub use upstream::GitLabUpstream;
