use diffparse::{Diff, FileMode, LineMode, ParseError, parse};

/// Six file entries as `git diff` prints them: a modification, two
/// deletions, two additions and a deleted symlink.
const SIX_FILES: &str = "diff --git a/file1 b/file1
index 83db48f..bf269f4 100644
--- a/file1
+++ b/file1
@@ -1,4 +1,4 @@
+add a line
 some
 lines
-in
 file1
diff --git a/file2 b/file2
deleted file mode 100644
index 5b6f3a7..0000000
--- a/file2
+++ /dev/null
@@ -1,3 +0,0 @@
-another
-file
-with lines
diff --git a/file3 b/file3
deleted file mode 100644
index f2bd1c4..0000000
--- a/file3
+++ /dev/null
@@ -1,2 +0,0 @@
-this is
-file3
diff --git a/file4 b/file4
new file mode 100644
index 0000000..6dd2c0d
--- /dev/null
+++ b/file4
@@ -0,0 +1,3 @@
+a
+new
+file
diff --git a/newname b/newname
new file mode 100644
index 0000000..4a9a1b3
--- /dev/null
+++ b/newname
@@ -0,0 +1 @@
+renamed by hand
diff --git a/symlink b/symlink
deleted file mode 120000
index c6ef6ff..0000000
--- a/symlink
+++ /dev/null
@@ -1 +0,0 @@
-file1
\\ No newline at end of file
";

fn six_files() -> Diff {
    let diff = parse(SIX_FILES).unwrap();
    assert_eq!(diff.files.len(), 6);
    diff
}

#[test]
fn file_modes_and_names() {
    let diff = six_files();
    let expected = [
        (FileMode::Modified, "file1", "file1"),
        (FileMode::Deleted, "file2", ""),
        (FileMode::Deleted, "file3", ""),
        (FileMode::New, "", "file4"),
        (FileMode::New, "", "newname"),
        (FileMode::Deleted, "symlink", ""),
    ];

    for (file, (mode, orig, new)) in diff.files.iter().zip(expected) {
        assert_eq!(file.mode, mode, "mode of {}", file.name());
        assert_eq!(file.orig_name, orig);
        assert_eq!(file.new_name, new);
    }
}

#[test]
fn first_hunk_ranges_and_lines() {
    let diff = six_files();
    let hunk = &diff.files[0].hunks[0];

    assert_eq!((hunk.orig_range.start, hunk.orig_range.length), (1, 4));
    assert_eq!((hunk.new_range.start, hunk.new_range.length), (1, 4));

    let orig: Vec<(LineMode, &str, u32, u32)> = hunk
        .orig_range
        .lines
        .iter()
        .map(|l| (l.mode, l.content.as_str(), l.number, l.diff_position))
        .collect();
    assert_eq!(
        orig,
        vec![
            (LineMode::Unchanged, "some", 1, 2),
            (LineMode::Unchanged, "lines", 2, 3),
            (LineMode::Removed, "in", 3, 4),
            (LineMode::Unchanged, "file1", 4, 5),
        ]
    );

    let new: Vec<(LineMode, &str, u32, u32)> = hunk
        .new_range
        .lines
        .iter()
        .map(|l| (l.mode, l.content.as_str(), l.number, l.diff_position))
        .collect();
    assert_eq!(
        new,
        vec![
            (LineMode::Added, "add a line", 1, 1),
            (LineMode::Unchanged, "some", 2, 2),
            (LineMode::Unchanged, "lines", 3, 3),
            (LineMode::Unchanged, "file1", 4, 5),
        ]
    );
}

#[test]
fn tallies_per_file() {
    let diff = six_files();
    let tallies: Vec<(u32, u32)> = diff.files.iter().map(|f| (f.additions, f.deletions)).collect();
    assert_eq!(tallies, vec![(1, 1), (0, 3), (0, 2), (3, 0), (1, 0), (0, 1)]);

    let stats = diff.stats();
    assert_eq!(stats.files, 6);
    assert_eq!(stats.hunks, 6);
    assert_eq!((stats.additions, stats.deletions), (5, 7));
}

#[test]
fn symlink_without_trailing_newline() {
    let diff = six_files();
    let hunk = &diff.files[5].hunks[0];
    assert!(hunk.orig_range.missing_newline);
    assert!(!hunk.new_range.missing_newline);
    assert_eq!(hunk.orig_range.lines.len(), 1);
}

#[test]
fn header_block_is_kept_per_file() {
    let diff = six_files();
    assert!(diff.files[1].diff_header.starts_with("diff --git a/file2 b/file2\ndeleted file mode 100644"));
    assert!(diff.files[5].diff_header.contains("deleted file mode 120000"));
}

#[test]
fn changed_excludes_deleted_files() {
    let diff = six_files();
    let changed = diff.changed();

    let names: Vec<&str> = changed.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["file1", "file4", "newname"]);
    assert_eq!(changed["file1"].iter().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(changed["file4"].iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn new_file_from_dev_null() {
    let diff = parse("--- /dev/null\n+++ b/file4\n@@ -0,0 +1,1 @@\n+hello\n").unwrap();
    let file = &diff.files[0];
    assert_eq!(file.mode, FileMode::New);
    assert_eq!(file.orig_name, "");
    assert_eq!(file.new_name, "file4");
}

#[test]
fn rename_markers_without_diff_line() {
    let diff = parse("rename from old.txt\nrename to new.txt\nsimilarity index 100%\n").unwrap();
    assert_eq!(diff.files.len(), 1);
    let file = &diff.files[0];
    assert_eq!(file.mode, FileMode::Renamed);
    assert_eq!(file.orig_name, "old.txt");
    assert_eq!(file.new_name, "new.txt");
    assert_eq!(file.similarity_index, 100);
}

#[test]
fn rename_to_updates_the_same_entry() {
    let input = "diff --git a/src/old.rs b/src/new.rs
similarity index 87%
rename from src/old.rs
rename to src/new.rs
index 1111111..2222222 100644
--- a/src/old.rs
+++ b/src/new.rs
@@ -1,2 +1,2 @@
 fn keep() {}
-fn old() {}
+fn new() {}
diff --git a/other.txt b/other.txt
--- a/other.txt
+++ b/other.txt
@@ -1 +1 @@
-x
+y
";
    let diff = parse(input).unwrap();
    assert_eq!(diff.files.len(), 2);

    let renamed = &diff.files[0];
    assert_eq!(renamed.mode, FileMode::Renamed);
    assert_eq!(renamed.orig_name, "src/old.rs");
    assert_eq!(renamed.new_name, "src/new.rs");
    assert_eq!(renamed.similarity_index, 87);
    assert_eq!((renamed.additions, renamed.deletions), (1, 1));
    assert_eq!(diff.changed()["src/new.rs"].iter().copied().collect::<Vec<_>>(), vec![2]);

    assert_eq!(diff.files[1].mode, FileMode::Modified);
}

#[test]
fn omitted_hunk_length_defaults_to_one() {
    let diff = parse("--- a/f\n+++ b/f\n@@ -1 +1,2 @@\n a\n+b\n").unwrap();
    let hunk = &diff.files[0].hunks[0];
    assert_eq!(hunk.orig_range.length, 1);
    assert_eq!(hunk.new_range.length, 2);
    assert_eq!(hunk.whole_range.length, 2);
}

#[test]
fn binary_files_have_no_hunks() {
    let diff = parse("Binary files a/img.png and b/img.png differ\n").unwrap();
    let file = &diff.files[0];
    assert_eq!(file.mode, FileMode::Modified);
    assert_eq!(file.orig_name, "img.png");
    assert_eq!(file.new_name, "img.png");
    assert!(file.binary);
    assert!(file.hunks.is_empty());
}

#[test]
fn binary_files_against_dev_null() {
    let input = "diff --git a/logo.png b/logo.png
new file mode 100644
index 0000000..3c4f1d2
Binary files /dev/null and b/logo.png differ
diff --git a/old.bin b/old.bin
deleted file mode 100644
index 3c4f1d2..0000000
Binary files a/old.bin and /dev/null differ
";
    let diff = parse(input).unwrap();
    assert_eq!(diff.files.len(), 2);
    assert_eq!((diff.files[0].mode, diff.files[0].new_name.as_str()), (FileMode::New, "logo.png"));
    assert_eq!(diff.files[0].orig_name, "");
    assert_eq!((diff.files[1].mode, diff.files[1].orig_name.as_str()), (FileMode::Deleted, "old.bin"));
    assert_eq!(diff.files[1].new_name, "");
}

#[test]
fn quoted_names_are_decoded() {
    let input = "diff --git \"a/dir/na\\303\\257ve file.txt\" \"b/dir/na\\303\\257ve file.txt\"
--- \"a/dir/na\\303\\257ve file.txt\"
+++ \"b/dir/na\\303\\257ve file.txt\"
@@ -1 +1 @@
-a
+b
";
    let diff = parse(input).unwrap();
    assert_eq!(diff.files[0].orig_name, "dir/naïve file.txt");
    assert_eq!(diff.files[0].new_name, "dir/naïve file.txt");
}

#[test]
fn undecodable_quoted_name_is_kept_as_is() {
    let input = "--- \"a/bad\\9name\"\n+++ b/ok\n@@ -1 +1 @@\n-a\n+b\n";
    let diff = parse(input).unwrap();
    assert_eq!(diff.files[0].orig_name, "\"a/bad\\9name\"");
    assert_eq!(diff.files[0].new_name, "ok");
}

#[test]
fn plain_unified_diff_with_timestamps() {
    let input = "--- a/hello.c\t2024-01-01 10:00:00.000000000 +0100
+++ b/hello.c\t2024-01-02 11:00:00.000000000 +0100
@@ -1,3 +1,3 @@
 #include <stdio.h>
-int main() { return 1; }
+int main() { return 0; }

";
    let diff = parse(input).unwrap();
    let file = &diff.files[0];
    assert_eq!(file.orig_name, "hello.c");
    assert_eq!(file.new_name, "hello.c");
    assert_eq!(file.hunks[0].new_range.lines.len(), 3);
}

#[test]
fn structural_errors_abort_the_whole_parse() {
    let err = parse(&format!("{SIX_FILES}diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1,z +1 @@\n")).unwrap_err();
    assert!(matches!(err, ParseError::MalformedHunkHeader { line: 55, .. }), "{err:?}");

    let err = parse("--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\n a\n*b\n").unwrap_err();
    assert_eq!(err.to_string(), "line 5: unrecognized line inside hunk: \"*b\"");

    let err = parse("Binary files a/x and b/y and b/z differ\n").unwrap_err();
    assert!(matches!(err, ParseError::MalformedBinaryMarker { line: 1, .. }));
}

#[test]
fn pure_rename_is_one_entry() {
    let input = "diff --git a/old b/new
similarity index 100%
rename from old
rename to new
";
    let diff = parse(input).unwrap();
    assert_eq!(diff.files.len(), 1);
    let file = &diff.files[0];
    assert_eq!(file.mode, FileMode::Renamed);
    assert_eq!((file.orig_name.as_str(), file.new_name.as_str()), ("old", "new"));
    assert!(file.hunks.is_empty());
}

#[test]
fn binary_marker_then_headerless_text_file() {
    let input = "Binary files a/x.png and b/x.png differ
--- a/y.txt
+++ b/y.txt
@@ -1 +1 @@
-a
+b
";
    let diff = parse(input).unwrap();
    assert_eq!(diff.files.len(), 2);
    assert!(diff.files[0].binary);
    assert_eq!(diff.files[0].name(), "x.png");
    assert!(!diff.files[1].binary);
    assert_eq!(diff.files[1].name(), "y.txt");

    let reparsed = parse(&diffparse::render::render(&diff)).unwrap();
    let tallies = |d: &Diff| -> Vec<(bool, u32, u32)> {
        d.files.iter().map(|f| (f.binary, f.additions, f.deletions)).collect()
    };
    assert_eq!(tallies(&reparsed), vec![(true, 0, 0), (false, 1, 1)]);
}

#[test]
fn undercounted_hunk_keeps_extra_lines() {
    let diff = parse("--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n+c\n").unwrap();
    let file = &diff.files[0];
    assert_eq!(file.additions, 2);
    assert_eq!(diff.changed()["f"].iter().copied().collect::<Vec<_>>(), vec![1, 2]);
}
