use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Result, SyncError};

pub const GITIGNORE_FILE: &str = ".gitignore";

/// Written once into directories that have no ignore list yet
pub const GITIGNORE_TEMPLATE: &str = "\
# Build output
target/
build/
dist/
out/
checkpoints/
results/

# Python cache files
__pycache__/
*.py[cod]
*$py.class
*.so

# Virtual environments
venv/
.venv/
env/
ENV/

# Credentials and secrets
.env
.env.*
*.pem
*.key
credentials.json
secrets.*

# Large binary and model files
*.pth
*.pt
*.ckpt
*.h5
*.onnx
*.model
*.npy
*.npz
*.mat
*.zip
*.tar.gz

# IDE files
.vscode/
.idea/
*.swp
*.swo

# OS files
.DS_Store
Thumbs.db

# Jupyter Notebook checkpoints
.ipynb_checkpoints/

# Log and temporary files
*.log
*.tmp
*.temp
";

/// Create `.gitignore` from the template unless one already exists.
/// Returns whether a file was written.
pub fn write_if_absent(workdir: &Path) -> Result<bool> {
    let path = workdir.join(GITIGNORE_FILE);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(SyncError::io(format!("Failed to create {}", path.display()), e)),
    };

    file.write_all(GITIGNORE_TEMPLATE.as_bytes())
        .map_err(|e| SyncError::io(format!("Failed to write {}", path.display()), e))?;
    info!(path = %path.display(), "wrote default ignore list");
    Ok(true)
}
