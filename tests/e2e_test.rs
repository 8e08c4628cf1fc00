use git_hunks::HunkStager;
use git2::{Repository, Signature};
use similar_asserts::assert_eq;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Test fixture for a git repository
struct Fixture {
    dir: TempDir,
    repo: Repository,
}

impl Fixture {
    /// Create a new empty repo with deterministic config
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repo");

        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        Self { dir, repo }
    }

    /// Repo with `name` committed as `content`
    fn with_committed(name: &str, content: &str) -> Self {
        let fixture = Self::new();
        fixture.write_file(name, content);
        fixture.stage_file(name);
        fixture.commit("initial");
        fixture
    }

    fn path(&self) -> &str {
        self.dir.path().to_str().unwrap()
    }

    fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read_file(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    fn stage_file(&self, name: &str) {
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    fn commit(&self, message: &str) {
        let sig = Signature::new(
            "Test User",
            "test@example.com",
            &git2::Time::new(1234567890, 0),
        )
        .unwrap();
        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let parents = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parents: Vec<&git2::Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    /// Content of `name` as currently staged
    fn index_content(&self, name: &str) -> String {
        let mut index = self.repo.index().unwrap();
        index.read(true).unwrap();
        let entry = index.get_path(Path::new(name), 0).unwrap();
        let blob = self.repo.find_blob(entry.id).unwrap();
        String::from_utf8(blob.content().to_vec()).unwrap()
    }

    fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(["-C", self.path()])
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(output.status.success(), "git {args:?} failed");
        String::from_utf8(output.stdout).unwrap()
    }

    /// Unstaged changes with zero context
    fn git_diff(&self, file: &str) -> String {
        self.git(&["diff", "--no-ext-diff", "-U0", "--no-color", file])
    }

    /// Staged changes with zero context
    fn git_diff_cached(&self, file: &str) -> String {
        self.git(&["diff", "--cached", "--no-ext-diff", "-U0", "--no-color", file])
    }

    fn apply(&self, patch: &str, cached: bool) {
        let mut args = vec!["-C", self.path(), "apply"];
        if cached {
            args.push("--cached");
        }
        args.extend(["--unidiff-zero", "-"]);

        let mut child = Command::new("git")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn git apply");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(patch.as_bytes())
            .unwrap();
        let output = child.wait_with_output().unwrap();

        assert!(
            output.status.success(),
            "git apply failed: {}\n{patch}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Build a patch from the current unstaged diff and apply it to the index
    fn stage(&self, file: &str, selection: &str) {
        let stager = HunkStager::new(&self.git_diff(file));
        let patch = stager.stage(file, selection, false).unwrap();
        assert!(!patch.is_empty(), "selection {selection} produced no patch");
        self.apply(&patch, true);
    }
}

fn numbered(lines: impl IntoIterator<Item = u32>) -> Vec<String> {
    lines.into_iter().map(|i| format!("line {i}")).collect()
}

fn text(lines: &[String]) -> String {
    lines.join("\n") + "\n"
}

#[test]
fn stage_one_hunk_of_two() {
    let mut lines = numbered(1..=20);
    let fixture = Fixture::with_committed("config.nix", &text(&lines));

    lines[2] = "line 3 changed".to_string();
    lines[14] = "line 15 changed".to_string();
    fixture.write_file("config.nix", &text(&lines));

    let stager = HunkStager::new(&fixture.git_diff("config.nix"));
    assert_eq!(stager.files()[0].hunks.len(), 2);

    fixture.stage("config.nix", "1");

    let mut expected = numbered(1..=20);
    expected[14] = "line 15 changed".to_string();
    assert_eq!(fixture.index_content("config.nix"), text(&expected));
}

#[test]
fn stage_some_added_lines() {
    let initial: Vec<String> = (1..=39).map(|i| format!("        line {i}")).collect();
    let fixture = Fixture::with_committed("default.nix", &text(&initial));

    let additions = [
        "        # Allow Stylix to override terminal font",
        "        \"terminal.integrated.fontFamily\" = lib.mkDefault \"monospace\";",
        "        \"direnv.restart.automatic\" = true;",
    ];
    let mut modified = initial.clone();
    modified.extend(additions.iter().map(|s| s.to_string()));
    fixture.write_file("default.nix", &text(&modified));

    fixture.stage("default.nix", "0:1..2");

    let mut expected = initial;
    expected.extend(additions[..2].iter().map(|s| s.to_string()));
    assert_eq!(fixture.index_content("default.nix"), text(&expected));

    // The remaining line is still unstaged
    let remaining = fixture.git_diff("default.nix");
    assert!(remaining.contains("@@ -41,0 +42 @@\n+        \"direnv.restart.automatic\" = true;\n"));
}

#[test]
fn stage_deletion() {
    let mut lines = numbered(1..=20);
    lines[14] = "      enableAutosuggestions = true;".to_string();
    let fixture = Fixture::with_committed("zsh.nix", &text(&lines));

    lines.remove(14);
    fixture.write_file("zsh.nix", &text(&lines));

    fixture.stage("zsh.nix", "0:1");
    assert_eq!(fixture.index_content("zsh.nix"), text(&lines));
}

#[test]
fn stage_single_addition_from_mixed_hunk() {
    let mut initial = numbered(1..=9);
    initial.extend([
        "    gtk.theme.name = \"Adwaita\";".to_string(),
        "    gtk.iconTheme.name = \"Papirus\";".to_string(),
        "line 12".to_string(),
    ]);
    let fixture = Fixture::with_committed("gtk.nix", &text(&initial));

    let mut modified = numbered(1..=9);
    modified.extend([
        "    # Theme managed by Stylix".to_string(),
        "    gtk.iconTheme.name = \"Papirus-Dark\";".to_string(),
        "    gtk.cursorTheme.size = 24;".to_string(),
        "line 12".to_string(),
    ]);
    fixture.write_file("gtk.nix", &text(&modified));

    let stager = HunkStager::new(&fixture.git_diff("gtk.nix"));
    let index = stager.files()[0].hunks[0]
        .lines
        .iter()
        .position(|line| line.content.contains("cursorTheme"))
        .unwrap();

    fixture.stage("gtk.nix", &format!("0:{index}"));

    let mut expected = initial;
    expected.insert(11, "    gtk.cursorTheme.size = 24;".to_string());
    assert_eq!(fixture.index_content("gtk.nix"), text(&expected));
}

#[test]
fn stage_character_range() {
    let fixture = Fixture::with_committed("greeting.txt", "a\nhello world\nc\n");
    fixture.write_file("greeting.txt", "a\nhello there world\nc\n");

    // Line 2 of the hunk is the added line; stage through "there "
    fixture.stage("greeting.txt", "0:2@6..12");

    assert_eq!(
        fixture.index_content("greeting.txt"),
        "a\nhello there \nc\n"
    );
}

#[test]
fn stage_character_range_of_pure_insertion() {
    let fixture = Fixture::with_committed("notes.txt", "first\nlast\n");
    fixture.write_file("notes.txt", "first\nmiddle part\nlast\n");

    fixture.stage("notes.txt", "0:1@0..6");

    assert_eq!(fixture.index_content("notes.txt"), "first\nmiddle\nlast\n");
}

#[test]
fn unstage_some_lines() {
    let fixture = Fixture::with_committed("list.txt", "one\ntwo\n");
    fixture.write_file("list.txt", "one\ntwo\nthree\nfour\n");
    fixture.stage_file("list.txt");

    let stager = HunkStager::new(&fixture.git_diff_cached("list.txt"));
    let patch = stager.stage("list.txt", "0:2", true).unwrap();
    fixture.apply(&patch, true);

    assert_eq!(fixture.index_content("list.txt"), "one\ntwo\nthree\n");
    assert_eq!(fixture.read_file("list.txt"), "one\ntwo\nthree\nfour\n");
}

#[test]
fn revert_hunk_in_worktree() {
    let lines = numbered(1..=10);
    let fixture = Fixture::with_committed("main.txt", &text(&lines));

    let mut modified = lines.clone();
    modified[4] = "line five".to_string();
    modified.insert(8, "inserted".to_string());
    fixture.write_file("main.txt", &text(&modified));

    let stager = HunkStager::new(&fixture.git_diff("main.txt"));
    fixture.apply(&stager.revert("main.txt", 1).unwrap(), false);

    modified.remove(8);
    assert_eq!(fixture.read_file("main.txt"), text(&modified));
}

#[test]
fn stage_file_without_trailing_newline() {
    let fixture = Fixture::with_committed("tail.txt", "alpha\nbeta");
    fixture.write_file("tail.txt", "alpha\nbeta\ngamma");

    fixture.stage("tail.txt", "0");
    assert_eq!(fixture.index_content("tail.txt"), "alpha\nbeta\ngamma");
}

#[test]
fn stage_newline_fix_without_new_line() {
    let fixture = Fixture::with_committed("tail.txt", "alpha\nbeta");
    fixture.write_file("tail.txt", "alpha\nbeta\ngamma");

    // Lines 1 and 2 are `-beta` (no newline) and `+beta`
    fixture.stage("tail.txt", "0:1,2");
    assert_eq!(fixture.index_content("tail.txt"), "alpha\nbeta\n");
}
