use std::fs;
use std::path::Path;

use clonehub::{git, github};


fn source_repo(path: &Path) {
    let repo = git2::Repository::init(path).unwrap();

    fs::write(path.join("README.md"), "# fixture\n").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature =
        git2::Signature::now("fixture", "fixture@example.com").unwrap();

    repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
        .unwrap();
}

fn descriptor(name: &str, clone_url: &str) -> github::Repo {
    github::Repo {
        name: name.to_owned(),
        clone_url: clone_url.to_owned(),
    }
}


#[test]
fn clones_each_descriptor_into_its_own_subdirectory() {
    let sources = tempfile::tempdir().unwrap();
    let source_a = sources.path().join("a");
    let source_b = sources.path().join("b");
    fs::create_dir_all(&source_a).unwrap();
    fs::create_dir_all(&source_b).unwrap();
    source_repo(&source_a);
    source_repo(&source_b);

    let clone_dir = tempfile::tempdir().unwrap();
    let repos = [
        descriptor("a", source_a.to_str().unwrap()),
        descriptor("b", source_b.to_str().unwrap()),
    ];

    let summary = git::clone_all(&repos, clone_dir.path());

    assert!(clone_dir.path().join("a/README.md").exists());
    assert!(clone_dir.path().join("b/README.md").exists());
    assert_eq!(summary.to_string(), "2 cloned, 0 skipped, 0 failed");
}

#[test]
fn an_existing_directory_only_skips_that_repository() {
    let sources = tempfile::tempdir().unwrap();
    let source_b = sources.path().join("b");
    fs::create_dir_all(&source_b).unwrap();
    source_repo(&source_b);

    let clone_dir = tempfile::tempdir().unwrap();
    fs::create_dir(clone_dir.path().join("a")).unwrap();

    let repos = [
        descriptor("a", "file:///nonexistent/a.git"),
        descriptor("b", source_b.to_str().unwrap()),
    ];

    let summary = git::clone_all(&repos, clone_dir.path());

    assert!(clone_dir.path().join("b/README.md").exists());
    assert_eq!(summary.to_string(), "1 cloned, 1 skipped, 0 failed");
}

#[test]
fn a_failed_clone_does_not_stop_the_batch() {
    let sources = tempfile::tempdir().unwrap();
    let source_b = sources.path().join("b");
    fs::create_dir_all(&source_b).unwrap();
    source_repo(&source_b);

    let clone_dir = tempfile::tempdir().unwrap();
    let repos = [
        descriptor("a", "file:///nonexistent/a.git"),
        descriptor("b", source_b.to_str().unwrap()),
    ];

    let summary = git::clone_all(&repos, clone_dir.path());

    assert!(summary.has_failures());
    assert!(clone_dir.path().join("b/README.md").exists());
    assert!(summary.to_string().starts_with("1 cloned, 0 skipped, 1 failed"));
}
