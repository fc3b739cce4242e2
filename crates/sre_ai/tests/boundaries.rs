use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(p) = stack.pop() {
        let entries = match fs::read_dir(&p) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn sre_ai_does_not_score_service_health() {
    // Guardrail: the reasoning side reads findings but never produces scores or statuses
    // for a service; scoring stays in the deterministic probes.
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let files = collect_rs_files(&src_root);
    assert!(!files.is_empty());

    let forbidden = [
        "sre_core::probes",
        "sre_core::metrics",
        "Thresholds",
        "classify(",
        "ServiceFinding::new",
        "ServiceFinding::failed",
    ];
    for f in files {
        let text = fs::read_to_string(&f).unwrap_or_default();
        for needle in forbidden {
            assert!(
                !text.contains(needle),
                "forbidden reference `{needle}` found in {}",
                f.display()
            );
        }
    }
}
