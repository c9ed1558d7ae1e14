use std::path::{Component, Path, PathBuf};

use gsmc_registry::Category;

use crate::error::PackError;

/// How artifacts are placed under the pack directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// `{dir}/{file}`
    #[default]
    Flat,
    /// `{dir}/{category}/{file}`
    Structured,
}

impl Layout {
    /// Target of `file_name` under `pack_dir`.
    ///
    /// `file_name` comes from the manifest or from the registry and must be a
    /// single plain path component, so the result never leaves `pack_dir`.
    pub fn target_path(
        &self,
        pack_dir: &Path,
        category: Category,
        file_name: &str,
    ) -> Result<PathBuf, PackError> {
        check_file_name(file_name)?;
        Ok(match self {
            Self::Flat => pack_dir.join(file_name),
            Self::Structured => pack_dir.join(category.directory()).join(file_name),
        })
    }
}

fn check_file_name(file_name: &str) -> Result<(), PackError> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == file_name => Ok(()),
        _ => Err(PackError::InvalidFileName(file_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn flat_ignores_category() {
        let path = Layout::Flat
            .target_path(Path::new("pack"), Category::Shader, "bsl.zip")
            .unwrap();
        assert_eq!(path, PathBuf::from("pack/bsl.zip"));
    }

    #[rstest]
    #[case(Category::Mod, "pack/mods/a.jar")]
    #[case(Category::Resource, "pack/resourcepacks/a.jar")]
    #[case(Category::Shader, "pack/shaderpacks/a.jar")]
    #[case(Category::Unknown, "pack/unknown/a.jar")]
    fn structured_uses_category_directory(#[case] category: Category, #[case] expected: &str) {
        let path = Layout::Structured
            .target_path(Path::new("pack"), category, "a.jar")
            .unwrap();
        assert_eq!(path, PathBuf::from(expected));
    }

    #[rstest]
    #[case("../escaped.jar")]
    #[case("..")]
    #[case(".")]
    #[case("")]
    #[case("/etc/passwd")]
    #[case("mods/nested.jar")]
    #[case("./a.jar")]
    #[case("a.jar/")]
    fn rejects_names_that_leave_the_target_directory(
        #[case] file_name: &str,
        #[values(Layout::Flat, Layout::Structured)] layout: Layout,
    ) {
        let result = layout.target_path(Path::new("pack"), Category::Mod, file_name);
        assert!(
            matches!(result, Err(PackError::InvalidFileName(ref name)) if name == file_name),
            "{file_name:?} was accepted: {result:?}"
        );
    }

    #[rstest]
    #[case("sodium-fabric-0.5.11+mc1.21.jar")]
    #[case(".hidden.zip")]
    #[case("BSL v8.2.09.zip")]
    fn accepts_plain_names(#[case] file_name: &str) {
        assert!(Layout::Flat
            .target_path(Path::new("pack"), Category::Mod, file_name)
            .is_ok());
    }
}
