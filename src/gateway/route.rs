/// What a `/container/...` path asks for.
///
/// Repository names may contain `/`, so the path is read from the end: the
/// last segment names the tags list or a manifest reference and everything
/// before it is the repository.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ContainerRoute {
    /// `{repository}/tags.json`
    Tags { repository: String },
    /// `{repository}/{reference}.json`
    Manifest {
        repository: String,
        reference: String,
    },
}

impl ContainerRoute {
    /// Parse the part of the path after `/container/`.
    pub(crate) fn parse(path: &str) -> Option<ContainerRoute> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let (repository, last) = path.rsplit_once('/')?;

        if repository.is_empty() {
            return None;
        }

        if last == "tags.json" {
            return Some(ContainerRoute::Tags {
                repository: repository.to_string(),
            });
        }

        let reference = last.strip_suffix(".json")?;
        if reference.is_empty() {
            return None;
        }

        Some(ContainerRoute::Manifest {
            repository: repository.to_string(),
            reference: reference.to_string(),
        })
    }
}
