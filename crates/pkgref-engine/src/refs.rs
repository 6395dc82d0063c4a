//! Reference migration: `packages.config` entries into `PackageReference` items.
//!
//! A pure tree transformation. The migrator mutates the project document in
//! memory and reports what it did; the orchestrator owns all disk I/O,
//! including saving the project and deleting the manifest afterwards.

use camino::Utf8Path;
use pkgref_xml::XmlDocument;

use crate::error::MigrateError;

/// What a reference migration did to a project document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMigration {
    /// `PackageReference` items added to the new item group.
    pub packages_added: usize,
    /// Legacy `Reference` items removed (attribute and hint-path matches).
    pub references_removed: usize,
    /// `Error` conditions for missing package targets removed.
    pub errors_removed: usize,
    /// Package-supplied `Import` declarations removed.
    pub imports_removed: usize,
    /// `true` when the manifest file may be deleted after a successful save.
    ///
    /// `false` means the restore-check target still declares errors, so the
    /// migration is incomplete and the manifest must stay for inspection.
    pub manifest_delete_safe: bool,
}

impl ReferenceMigration {
    /// Returns a one-line human-readable summary for the log.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "added {} package reference(s), removed {} reference(s), {} error condition(s), {} import(s)",
            self.packages_added, self.references_removed, self.errors_removed, self.imports_removed
        )
    }
}

/// The `ToolsVersion` the migrated project is stamped with.
const UPGRADED_TOOLS_VERSION: &str = "15.0";

/// Name of the restore-check target left behind by manifest-driven installs.
const RESTORE_TARGET_NAME: &str = "EnsureNuGetPackageBuildImports";

/// Migrates every manifest entry into the project document.
///
/// For each `(id, version)` entry in the manifest, in document order:
///
/// 1. a `PackageReference` with `Include`/`Version` is added to a new
///    `ItemGroup`;
/// 2. every `Reference` whose `Include`'s first comma-separated segment
///    equals the id (case-insensitive) is removed;
/// 3. every remaining `Reference` whose descendant text contains the id is
///    removed (hint-path-only matches);
/// 4. every `Error` whose `Condition` contains the id is removed;
/// 5. every `Import` whose `Project` attribute contains the id is removed.
///
/// Steps 3-5 match by plain substring. That is intentionally permissive and
/// can over-remove when one package id is a substring of another; the
/// heuristic is inherited from the data being migrated and has no narrower
/// correct form.
///
/// Afterwards the new group is inserted before the first existing
/// `ItemGroup` (or appended to the root when none exists), the manifest's
/// own `None` item is dropped, the restore-check target is dropped when it
/// has no remaining `Error` children, and the root `ToolsVersion` is raised.
///
/// # Errors
///
/// Returns [`MigrateError::Xml`] when a manifest entry is missing its `id`
/// or `version` attribute; the whole file's migration fails rather than the
/// entry being skipped.
pub fn migrate_references(
    project: &mut XmlDocument,
    manifest: &XmlDocument,
    manifest_path: &Utf8Path,
) -> Result<ReferenceMigration, MigrateError> {
    let project_root = project.root();
    let group = project.create_element("ItemGroup");

    let mut packages_added = 0;
    let mut references_removed = 0;
    let mut errors_removed = 0;
    let mut imports_removed = 0;

    for entry in manifest.child_elements(manifest.root()) {
        let id = manifest
            .require_attribute(entry, "id")
            .map_err(|e| MigrateError::xml(manifest_path, e))?
            .to_owned();
        let version = manifest
            .require_attribute(entry, "version")
            .map_err(|e| MigrateError::xml(manifest_path, e))?
            .to_owned();

        let package = project.create_element("PackageReference");
        project.set_attribute(package, "Include", &id);
        project.set_attribute(package, "Version", &version);
        project.append_child(group, package);
        packages_added += 1;

        // Direct assembly references for this package.
        for reference in project.descendants_named(project_root, "Reference") {
            let matched = project.attribute(reference, "Include").is_some_and(|inc| {
                inc.split(',')
                    .next()
                    .is_some_and(|first| first.eq_ignore_ascii_case(&id))
            });
            if matched {
                project.detach(reference);
                references_removed += 1;
            }
        }

        // References only identifiable through their hint path text.
        for reference in project.descendants_named(project_root, "Reference") {
            if project.descendant_text_contains(reference, &id) {
                project.detach(reference);
                references_removed += 1;
            }
        }

        // Build-failure conditions guarding this package's targets.
        for error in project.descendants_named(project_root, "Error") {
            if project
                .attribute(error, "Condition")
                .is_some_and(|c| c.contains(&id))
            {
                project.detach(error);
                errors_removed += 1;
            }
        }

        // Package-delivered target imports.
        for import in project.descendants_named(project_root, "Import") {
            if project
                .attribute(import, "Project")
                .is_some_and(|p| p.contains(&id))
            {
                project.detach(import);
                imports_removed += 1;
            }
        }
    }

    // Place the new group before the first existing ItemGroup so it reads
    // where references used to live. A project without any ItemGroup just
    // gets it appended.
    let anchor = project
        .child_elements(project_root)
        .into_iter()
        .find(|&child| project.local_name(child) == "ItemGroup");
    match anchor {
        Some(anchor) => {
            project.insert_before(anchor, group);
        }
        None => project.append_child(project_root, group),
    }

    // The manifest's own project item is no longer wanted.
    let manifest_item = project
        .descendants_named(project_root, "None")
        .into_iter()
        .find(|&item| project.attribute(item, "Include") == Some("packages.config"));
    if let Some(item) = manifest_item {
        project.detach(item);
    }

    // Drop the restore-check target, but only when nothing in it still
    // declares an error. A surviving error means part of the migration did
    // not take and the target must stay visible.
    let mut manifest_delete_safe = true;
    let restore_target = project
        .descendants_named(project_root, "Target")
        .into_iter()
        .find(|&target| project.attribute(target, "Name") == Some(RESTORE_TARGET_NAME));
    if let Some(target) = restore_target {
        if project.descendants_named(target, "Error").is_empty() {
            project.detach(target);
        } else {
            manifest_delete_safe = false;
        }
    }

    project.set_attribute(project_root, "ToolsVersion", UPGRADED_TOOLS_VERSION);

    Ok(ReferenceMigration {
        packages_added,
        references_removed,
        errors_removed,
        imports_removed,
        manifest_delete_safe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="12.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
    <Reference Include="Newtonsoft.Json, Version=12.0.0.0, Culture=neutral">
      <HintPath>..\packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll</HintPath>
    </Reference>
    <Reference Include="System.Core" />
  </ItemGroup>
  <ItemGroup>
    <None Include="packages.config" />
    <Compile Include="Program.cs" />
  </ItemGroup>
  <Import Project="..\packages\Newtonsoft.Json.12.0.3\build\Newtonsoft.Json.targets" />
  <Target Name="EnsureNuGetPackageBuildImports" BeforeTargets="PrepareForBuild">
    <Error Condition="!Exists('..\packages\Newtonsoft.Json.12.0.3\build\Newtonsoft.Json.targets')" Text="missing" />
  </Target>
</Project>"#;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net45" />
</packages>"#;

    fn parse(text: &str) -> XmlDocument {
        match XmlDocument::parse(text) {
            Ok(doc) => doc,
            Err(e) => unreachable!("fixture must parse: {e}"),
        }
    }

    fn manifest_path() -> &'static Utf8Path {
        Utf8Path::new("proj/packages.config")
    }

    #[test]
    fn test_migrates_manifest_entry() -> Result<(), MigrateError> {
        let mut project = parse(PROJECT);
        let manifest = parse(MANIFEST);

        let result = migrate_references(&mut project, &manifest, manifest_path())?;

        assert_eq!(result.packages_added, 1);
        assert_eq!(result.references_removed, 1);
        assert_eq!(result.errors_removed, 1);
        assert_eq!(result.imports_removed, 1);
        assert!(result.manifest_delete_safe);

        let root = project.root();
        let packages = project.descendants_named(root, "PackageReference");
        assert_eq!(packages.len(), 1);
        assert_eq!(
            project.attribute(packages[0], "Include"),
            Some("Newtonsoft.Json")
        );
        assert_eq!(project.attribute(packages[0], "Version"), Some("12.0.3"));

        // The unrelated framework reference survives.
        let remaining = project.descendants_named(root, "Reference");
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            project.attribute(remaining[0], "Include"),
            Some("System.Core")
        );
        Ok(())
    }

    #[test]
    fn test_housekeeping_after_loop() -> Result<(), MigrateError> {
        let mut project = parse(PROJECT);
        let manifest = parse(MANIFEST);

        migrate_references(&mut project, &manifest, manifest_path())?;

        let root = project.root();
        assert_eq!(project.attribute(root, "ToolsVersion"), Some("15.0"));
        assert!(project.descendants_named(root, "None").is_empty());
        assert!(project.descendants_named(root, "Target").is_empty());

        // New group sits before the original first ItemGroup.
        let groups = project
            .child_elements(root)
            .into_iter()
            .filter(|&c| project.local_name(c) == "ItemGroup")
            .collect::<Vec<_>>();
        assert_eq!(groups.len(), 3);
        assert!(!project.descendants_named(groups[0], "PackageReference").is_empty());
        Ok(())
    }

    #[test]
    fn test_hint_path_only_reference_removed() -> Result<(), MigrateError> {
        let mut project = parse(
            r#"<Project ToolsVersion="12.0">
                 <ItemGroup>
                   <Reference Include="SomethingElse">
                     <HintPath>..\packages\Serilog.2.10.0\lib\Serilog.dll</HintPath>
                   </Reference>
                 </ItemGroup>
               </Project>"#,
        );
        let manifest = parse(r#"<packages><package id="Serilog" version="2.10.0"/></packages>"#);

        let result = migrate_references(&mut project, &manifest, manifest_path())?;
        assert_eq!(result.references_removed, 1);
        assert!(project.descendants_named(project.root(), "Reference").is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_version_fails_whole_file() {
        let mut project = parse(r#"<Project ToolsVersion="12.0"><ItemGroup/></Project>"#);
        let manifest = parse(r#"<packages><package id="Serilog"/></packages>"#);

        let result = migrate_references(&mut project, &manifest, manifest_path());
        assert!(matches!(
            result,
            Err(MigrateError::Xml { ref path, .. }) if path == manifest_path()
        ));
    }

    #[test]
    fn test_restore_target_with_surviving_error_is_kept() -> Result<(), MigrateError> {
        let mut project = parse(
            r#"<Project ToolsVersion="12.0">
                 <ItemGroup><Compile Include="a.cs"/></ItemGroup>
                 <Target Name="EnsureNuGetPackageBuildImports">
                   <Error Condition="!Exists('..\packages\Unmigrated.1.0\build\t.targets')" Text="missing" />
                 </Target>
               </Project>"#,
        );
        let manifest = parse(r#"<packages><package id="Serilog" version="2.10.0"/></packages>"#);

        let result = migrate_references(&mut project, &manifest, manifest_path())?;
        assert!(!result.manifest_delete_safe);
        assert_eq!(
            project.descendants_named(project.root(), "Target").len(),
            1
        );
        Ok(())
    }

    #[test]
    fn test_project_without_item_group_appends() -> Result<(), MigrateError> {
        let mut project = parse(r#"<Project ToolsVersion="12.0"/>"#);
        let manifest = parse(r#"<packages><package id="Serilog" version="2.10.0"/></packages>"#);

        migrate_references(&mut project, &manifest, manifest_path())?;
        let root = project.root();
        assert_eq!(project.descendants_named(root, "PackageReference").len(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_manifest_still_does_housekeeping() -> Result<(), MigrateError> {
        let mut project = parse(PROJECT);
        let manifest = parse("<packages/>");

        let result = migrate_references(&mut project, &manifest, manifest_path())?;
        assert_eq!(result.packages_added, 0);
        assert_eq!(
            project.attribute(project.root(), "ToolsVersion"),
            Some("15.0")
        );
        // Untouched references stay: nothing matched them.
        assert_eq!(
            project.descendants_named(project.root(), "Reference").len(),
            2
        );
        Ok(())
    }
}
