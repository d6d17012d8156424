//! IPC codec and wire protocol — MessagePack framing.

pub mod codec;
pub mod protocol;

use std::path::{Path, PathBuf};

/// Socket path: the explicit one if given, else
/// `$XDG_RUNTIME_DIR/favoritesd/server.sock`.
pub fn socket_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")?;
    Some(
        PathBuf::from(runtime_dir)
            .join("favoritesd")
            .join("server.sock"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let p = Path::new("/tmp/custom.sock");
        assert_eq!(socket_path(Some(p)).unwrap(), p);
    }
}
