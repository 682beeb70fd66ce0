use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use trellis::error::{Chainable, Result};
use trellis::error;

use crate::build::Site;

const INDEX: &str = "index.html";

/// Serves the output directory on `port` until the process is stopped,
/// rebuilding in the background as sources change.
pub fn serve(site: Site, port: u16) -> Result<()> {
    let address = format!("127.0.0.1:{port}");
    let server = Server::http(&address)
        .map_err(|e| error!(Io: "failed to start preview server", "address" => &address, e))?;

    let root = site.config.output();
    let watcher = site.clone();
    std::thread::spawn(move || {
        if let Err(e) = crate::watch::watch(&watcher) {
            log::error!("file watcher stopped\n{e}");
        }
    });

    log::info!("serving {} at http://{address}/", root.display());
    for request in server.incoming_requests() {
        let response = match respond(&request, &root) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("{e}");
                Response::from_string("Internal Server Error")
                    .with_status_code(StatusCode(500))
                    .boxed()
            }
        };

        log::debug!("{} {} -> {}", request.method(), request.url(), response.status_code().0);
        if let Err(e) = request.respond(response) {
            log::warn!("failed to send response: {e}");
        }
    }

    Ok(())
}

fn status(code: u16, message: &str) -> Response<Box<dyn Read + Send>> {
    Response::from_string(message)
        .with_status_code(StatusCode(code))
        .boxed()
}

fn respond(request: &Request, root: &Path) -> Result<Response<Box<dyn Read + Send>>> {
    let method = request.method();
    if method != &Method::Get && method != &Method::Head {
        return Ok(status(405, "Method Not Allowed"));
    }

    let Some(path) = resolve(root, request.url()) else {
        return Ok(status(404, "Not Found"));
    };

    let file = File::open(&path).chain_with(|| error! {
        "failed to open file",
        "path" => path.display(),
    })?;

    let header = content_type_header(&path);
    if method == &Method::Head {
        let length = file.metadata().map(|m| m.len() as usize).ok();
        return Ok(Response::new(StatusCode(200), vec![header], std::io::empty(), length, None).boxed());
    }

    Ok(Response::from_file(file).with_header(header).boxed())
}

/// The file under `root` that `url` names, if there is one. Directories
/// resolve to their `index.html`. URLs that would leave `root` resolve to
/// nothing.
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = urlencoding::decode(path).ok()?;
    if decoded.contains('\\') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    let mut full = root.join(relative);
    if full.is_dir() {
        full.push(INDEX);
    }

    full.is_file().then_some(full)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

fn content_type_header(path: &Path) -> Header {
    Header::from_bytes("Content-Type", content_type_for(path)).expect("valid header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn output() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("blog/index.html"), "blog").unwrap();
        fs::write(dir.path().join("blog/my post.html"), "post").unwrap();
        dir
    }

    #[test]
    fn resolves_files_and_indexes() {
        let dir = output();
        let root = dir.path();

        assert_eq!(resolve(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve(root, "/blog"), Some(root.join("blog/index.html")));
        assert_eq!(resolve(root, "/blog/?page=2"), Some(root.join("blog/index.html")));
        assert_eq!(resolve(root, "/blog/my%20post.html#top"), Some(root.join("blog/my post.html")));
        assert_eq!(resolve(root, "/missing.html"), None);
    }

    #[test]
    fn rejects_traversal() {
        let dir = output();
        let root = dir.path().join("blog");

        assert_eq!(resolve(&root, "/../index.html"), None);
        assert_eq!(resolve(&root, "/%2e%2e/index.html"), None);
        assert_eq!(resolve(&root, "/..%5Cindex.html"), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a/index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("app.css")), "text/css; charset=utf-8");
        assert_eq!(content_type_for(Path::new("photo.JPG")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("LICENSE")), "application/octet-stream");
    }
}
