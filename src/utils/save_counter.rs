//! 顺序保存计数
//!
//! 每次保存都重新扫描目录, 下一个序号为已有最大序号加一

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use log::debug;
use regex::Regex;

use crate::error::Error;

/// 文件名前缀中的批次序号占位符
pub const BATCH_NUM_TOKEN: &str = "%batch_num%";

/// 保存计数器
///
/// 匹配 `{prefix}_{至少5位数字}_*.png`
pub struct SaveCounter {
    directory: PathBuf,
    pattern: Regex,
}

impl SaveCounter {
    pub fn new(directory: impl Into<PathBuf>, prefix: &str) -> Result<Self, Error> {
        // 占位符可匹配任意批次序号
        let escaped = regex::escape(prefix).replace(BATCH_NUM_TOKEN, r"\d+");
        let pattern = Regex::new(&format!(r"^{escaped}_(\d{{5,}})_.*\.png$"))?;

        Ok(Self {
            directory: directory.into(),
            pattern,
        })
    }

    /// 目录中已有的序号, 目录不存在时为空
    pub fn indices(&self) -> Result<Vec<u64>, Error> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut indices = Vec::new();
        for entry in entries {
            let file_name = entry?.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(index) = self
                .pattern
                .captures(file_name)
                .and_then(|caps| caps[1].parse::<u64>().ok())
            {
                indices.push(index);
            }
        }
        Ok(indices)
    }

    pub fn next_index(&self) -> Result<u64, Error> {
        let next = self.indices()?.into_iter().max().map_or(1, |max| max + 1);
        debug!("next save index in {}: {next}", self.directory.display());
        Ok(next)
    }
}

/// 下一个可用序号, 没有匹配文件时为 1
pub fn next_index(directory: impl AsRef<Path>, prefix: &str) -> Result<u64, Error> {
    SaveCounter::new(directory.as_ref(), prefix)?.next_index()
}

/// `{prefix}_{index:05}_{seed}_.png` 或 `{prefix}_{index:05}_.png`
pub fn build_filename(prefix: &str, index: u64, seed: Option<u64>) -> String {
    match seed {
        Some(seed) => format!("{prefix}_{index:05}_{seed}_.png"),
        None => format!("{prefix}_{index:05}_.png"),
    }
}

/// 保存路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePath {
    pub full_output_folder: PathBuf,
    pub filename: String,
    pub subfolder: String,
}

impl SavePath {
    /// 解析文件名前缀
    ///
    /// 支持 `%width%` / `%height%` 替换, 前缀可带子目录, 不允许离开输出目录
    pub fn resolve(
        output_dir: &Path,
        filename_prefix: &str,
        width: usize,
        height: usize,
    ) -> Result<Self, Error> {
        let prefix = filename_prefix
            .replace("%width%", &width.to_string())
            .replace("%height%", &height.to_string());
        let prefix_path = Path::new(&prefix);

        // "sub/" 之类以分隔符结尾的前缀没有文件名部分
        if prefix.is_empty() || prefix.ends_with('/') || prefix.ends_with('\\') {
            return Err(Error::Validation(format!(
                "filename prefix '{filename_prefix}' has no file name"
            )));
        }

        let escapes = prefix_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::Validation(format!(
                "saving image outside the output folder is not allowed, prefix: {filename_prefix}"
            )));
        }

        let filename = prefix_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::Validation(format!("filename prefix '{filename_prefix}' has no file name"))
            })?
            .to_string();
        let subfolder = prefix_path.parent().unwrap_or_else(|| Path::new(""));

        Ok(Self {
            full_output_folder: output_dir.join(subfolder),
            filename,
            subfolder: subfolder.to_string_lossy().into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;

    fn touch(dir: &Path, names: &[&str]) -> anyhow::Result<()> {
        for name in names {
            File::create(dir.join(name))?;
        }
        Ok(())
    }

    #[test]
    fn test_next_index_empty_and_missing_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(next_index(dir.path(), "prefix")?, 1);
        assert_eq!(next_index(dir.path().join("missing"), "prefix")?, 1);
        Ok(())
    }

    #[test]
    fn test_next_index_after_existing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), &["prefix_00001_.png", "prefix_00003_.png"])?;

        assert_eq!(next_index(dir.path(), "prefix")?, 4);
        Ok(())
    }

    #[test]
    fn test_next_index_ignores_unrelated_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(
            dir.path(),
            &[
                "prefix_00002_.png",
                "prefix_abc.png",
                "prefix_0007_.png",
                "prefix_00008_.jpg",
                "prefixx_00010_.png",
                "other_00009_.png",
                "notes.txt",
            ],
        )?;

        assert_eq!(next_index(dir.path(), "prefix")?, 3);
        Ok(())
    }

    #[test]
    fn test_next_index_with_seed_and_wide_index() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), &["img_00012_42_.png", "img_123456_.png"])?;

        assert_eq!(next_index(dir.path(), "img")?, 123457);
        Ok(())
    }

    #[test]
    fn test_next_index_escapes_prefix() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), &["a.b(1)_00002_.png", "aXb(1)_00005_.png"])?;

        assert_eq!(next_index(dir.path(), "a.b(1)")?, 3);
        Ok(())
    }

    #[test]
    fn test_next_index_batch_token() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), &["frame_0_00001_.png", "frame_1_00002_.png"])?;

        assert_eq!(next_index(dir.path(), "frame_%batch_num%")?, 3);
        Ok(())
    }

    #[test]
    fn test_build_filename() {
        assert_eq!(build_filename("img", 7, Some(42)), "img_00007_42_.png");
        assert_eq!(build_filename("img", 7, None), "img_00007_.png");
        assert_eq!(build_filename("img", 123456, None), "img_123456_.png");
    }

    #[test]
    fn test_save_path_resolve() -> anyhow::Result<()> {
        let output = Path::new("/comfy/output");

        let path = SavePath::resolve(output, "ComfyUI", 512, 512)?;
        assert_eq!(path.filename, "ComfyUI");
        assert_eq!(path.subfolder, "");
        assert_eq!(path.full_output_folder, output);

        let path = SavePath::resolve(output, "wan/clip_%width%x%height%", 832, 480)?;
        assert_eq!(path.filename, "clip_832x480");
        assert_eq!(path.subfolder, "wan");
        assert_eq!(path.full_output_folder, output.join("wan"));
        Ok(())
    }

    #[test]
    fn test_save_path_rejects_escape() {
        let output = Path::new("/comfy/output");

        for prefix in ["../outside", "/etc/passwd", "a/../../b", "", "sub/", "sub\\", "a/b/"] {
            assert!(
                matches!(
                    SavePath::resolve(output, prefix, 1, 1),
                    Err(Error::Validation(_))
                ),
                "prefix '{prefix}'"
            );
        }
    }
}
