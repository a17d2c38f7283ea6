#![allow(dead_code)]

pub mod test_server {
    use apphub::hub::AppRegistry;
    use apphub::middleware::{CorsMiddleware, TracingMiddleware};
    use apphub::router::Router;
    use apphub::server::{AppService, AppState, HttpServer, ServerHandle};
    use apphub::static_files::StaticFiles;
    use apphub::store::{KvStore, MemoryKv, RecordStore};
    use std::net::SocketAddr;
    use std::sync::{Arc, Once};

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x40000);
        });
    }

    pub struct TestServer {
        pub handle: ServerHandle,
        pub addr: SocketAddr,
    }

    impl TestServer {
        pub fn stop(self) {
            self.handle.stop();
        }
    }

    /// Start the full hub (tracing + CORS) on an ephemeral port.
    pub fn start(
        apps_dir: &std::path::Path,
        frontend: Option<&std::path::Path>,
        store: Option<Arc<dyn RecordStore>>,
    ) -> TestServer {
        setup_may_runtime();
        let registry = Arc::new(AppRegistry::new(apps_dir));
        registry.scan();
        let state = AppState::new(registry, store, frontend.map(StaticFiles::new));
        let service = AppService::new(state, Router::hub().unwrap())
            .with_middleware(Arc::new(TracingMiddleware))
            .with_middleware(Arc::new(CorsMiddleware::default()));
        let handle = HttpServer(service).start("127.0.0.1:0").unwrap();
        handle.wait_ready().unwrap();
        let addr = handle.local_addr();
        TestServer { handle, addr }
    }

    /// Hub backed by a fresh in-memory store.
    pub fn start_with_memory_store(apps_dir: &std::path::Path) -> TestServer {
        start(apps_dir, None, Some(Arc::new(KvStore::new(MemoryKv::new()))))
    }
}

pub mod app_tree {
    use std::fs;
    use std::path::Path;

    /// Create `root/name/index.html` plus optional metadata.
    pub fn make_app(root: &Path, name: &str, html: &str, metadata: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.html"), html).unwrap();
        if let Some(meta) = metadata {
            fs::write(dir.join("app-metadata.json"), meta).unwrap();
        }
    }

    pub fn write_file(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

pub mod http {
    use serde_json::Value;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    #[derive(Debug)]
    pub struct TestResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl TestResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).to_string()
        }

        pub fn json(&self) -> Value {
            serde_json::from_slice(&self.body)
                .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.text()))
        }
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> TestResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            if let Some(resp) = try_parse(&buf) {
                return resp;
            }
            let mut tmp = [0u8; 4096];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        try_parse(&buf).unwrap_or_else(|| {
            panic!("incomplete response: {}", String::from_utf8_lossy(&buf))
        })
    }

    /// Build and send a request with an optional body.
    pub fn request(addr: &SocketAddr, method: &str, path: &str, body: Option<&str>) -> TestResponse {
        let raw = match body {
            Some(body) => format!(
                "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            ),
            None => format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
        };
        send_request(addr, &raw)
    }

    pub fn get(addr: &SocketAddr, path: &str) -> TestResponse {
        request(addr, "GET", path, None)
    }

    fn try_parse(buf: &[u8]) -> Option<TestResponse> {
        let split = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
        let head = String::from_utf8_lossy(&buf[..split]).to_string();
        let mut lines = head.split("\r\n");
        let status = lines.next()?.split_whitespace().nth(1)?.parse().ok()?;
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
            .collect();
        let len = headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let body = &buf[split + 4..];
        if body.len() < len {
            return None;
        }
        Some(TestResponse {
            status,
            headers,
            body: body[..len].to_vec(),
        })
    }
}
