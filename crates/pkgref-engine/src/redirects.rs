//! Binding-redirect consolidation for `app.config` / `web.config` files.
//!
//! Repeated package installs leave several `dependentAssembly` entries for
//! the same assembly. The merger keeps exactly one entry per assembly name,
//! the one carrying the highest `newVersion`, and rebuilds the
//! `assemblyBinding` section in place.

use camino::Utf8Path;
use pkgref_core::AssemblyVersion;
use pkgref_xml::{NodeId, XmlDocument, XmlError};
use rustc_hash::FxHashMap;

use crate::error::MigrateError;

/// Entry counts before and after a redirect merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectMerge {
    /// `dependentAssembly` entries found in the original section.
    pub before: usize,
    /// Entries surviving deduplication.
    pub after: usize,
}

impl RedirectMerge {
    /// Returns a one-line human-readable summary for the log.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "consolidated {} binding redirect(s) down to {}",
            self.before, self.after
        )
    }
}

/// Deduplicates `dependentAssembly` entries in a configuration document.
///
/// Entries are keyed by the `assemblyIdentity` `name` attribute
/// (case-sensitive) and compared by their `bindingRedirect` `newVersion`,
/// parsed as a dotted numeric version with missing components treated as
/// zero. A strictly greater version replaces the kept entry in place; ties
/// keep the first-seen entry. Survivors retain their relative order of first
/// appearance.
///
/// The section is rebuilt wholesale: a fresh `assemblyBinding` element with
/// the original's attributes replaces the old one, so stale duplicates
/// cannot linger.
///
/// # Errors
///
/// - [`MigrateError::Xml`] when the document has no `assemblyBinding`
///   section, or an entry lacks `assemblyIdentity`, `bindingRedirect`, or a
///   required attribute on either.
/// - [`MigrateError::Version`] when a `newVersion` value does not parse.
///
/// Any of these fails the whole file; no partial merge is written.
pub fn merge_redirects(
    config: &mut XmlDocument,
    path: &Utf8Path,
) -> Result<RedirectMerge, MigrateError> {
    let root = config.root();
    let section = config
        .first_descendant_named(root, "assemblyBinding")
        .ok_or_else(|| MigrateError::xml(path, XmlError::missing_element("assemblyBinding")))?;

    let entries: Vec<NodeId> = config
        .child_elements(section)
        .into_iter()
        .filter(|&child| config.local_name(child) == "dependentAssembly")
        .collect();
    let before = entries.len();

    // First-seen position per assembly name; a higher version replaces the
    // survivor in place so output order is stable.
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut survivors: Vec<(NodeId, AssemblyVersion)> = Vec::new();

    for entry in entries {
        let (name, version) = entry_identity(config, path, entry)?;
        match index.get(&name) {
            Some(&slot) => {
                if version > survivors[slot].1 {
                    survivors[slot] = (entry, version);
                }
            }
            None => {
                index.insert(name, survivors.len());
                survivors.push((entry, version));
            }
        }
    }
    let after = survivors.len();

    // Rebuild the section from the survivors. Appending reparents each
    // entry out of the old section, which is then dropped entirely.
    let section_name = config.name(section).to_owned();
    let section_attrs: Vec<(String, String)> = config.attributes(section).to_vec();

    let merged = config.create_element(&section_name);
    for (key, value) in &section_attrs {
        config.set_attribute(merged, key, value);
    }
    for (entry, _) in survivors {
        config.append_child(merged, entry);
    }
    config.insert_before(section, merged);
    config.detach(section);

    Ok(RedirectMerge { before, after })
}

/// Extracts the assembly name and target version from one entry.
fn entry_identity(
    config: &XmlDocument,
    path: &Utf8Path,
    entry: NodeId,
) -> Result<(String, AssemblyVersion), MigrateError> {
    let identity = config
        .first_descendant_named(entry, "assemblyIdentity")
        .ok_or_else(|| MigrateError::xml(path, XmlError::missing_element("assemblyIdentity")))?;
    let name = config
        .require_attribute(identity, "name")
        .map_err(|e| MigrateError::xml(path, e))?
        .to_owned();

    let redirect = config
        .first_descendant_named(entry, "bindingRedirect")
        .ok_or_else(|| MigrateError::xml(path, XmlError::missing_element("bindingRedirect")))?;
    let version = config
        .require_attribute(redirect, "newVersion")
        .map_err(|e| MigrateError::xml(path, e))?
        .parse::<AssemblyVersion>()
        .map_err(|e| MigrateError::version(path, e))?;

    Ok((name, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    const CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <runtime>
    <assemblyBinding xmlns="urn:schemas-microsoft-com:asm.v1">
      <dependentAssembly>
        <assemblyIdentity name="Newtonsoft.Json" publicKeyToken="30ad4fe6b2a6aeed" culture="neutral" />
        <bindingRedirect oldVersion="0.0.0.0-11.0.0.0" newVersion="11.0.0.0" />
      </dependentAssembly>
      <dependentAssembly>
        <assemblyIdentity name="Serilog" culture="neutral" />
        <bindingRedirect oldVersion="0.0.0.0-2.0.0.0" newVersion="2.0.0.0" />
      </dependentAssembly>
      <dependentAssembly>
        <assemblyIdentity name="Newtonsoft.Json" publicKeyToken="30ad4fe6b2a6aeed" culture="neutral" />
        <bindingRedirect oldVersion="0.0.0.0-12.0.0.0" newVersion="12.0.0.0" />
      </dependentAssembly>
    </assemblyBinding>
  </runtime>
</configuration>"#;

    fn parse(text: &str) -> XmlDocument {
        match XmlDocument::parse(text) {
            Ok(doc) => doc,
            Err(e) => unreachable!("fixture must parse: {e}"),
        }
    }

    fn config_path() -> &'static Utf8Path {
        Utf8Path::new("proj/app.config")
    }

    #[test]
    fn test_highest_version_wins() -> Result<(), MigrateError> {
        let mut config = parse(CONFIG);

        let result = merge_redirects(&mut config, config_path())?;
        assert_eq!(result, RedirectMerge { before: 3, after: 2 });

        let root = config.root();
        let entries = config.descendants_named(root, "dependentAssembly");
        assert_eq!(entries.len(), 2);

        let json = config
            .first_descendant_named(root, "bindingRedirect")
            .and_then(|r| config.attribute(r, "newVersion"));
        assert_eq!(json, Some("12.0.0.0"));
        Ok(())
    }

    #[test]
    fn test_survivor_order_is_first_seen() -> Result<(), MigrateError> {
        let mut config = parse(CONFIG);
        merge_redirects(&mut config, config_path())?;

        let names: Vec<String> = config
            .descendants_named(config.root(), "assemblyIdentity")
            .into_iter()
            .filter_map(|id| config.attribute(id, "name").map(str::to_owned))
            .collect();
        // Newtonsoft.Json stays in its first-seen slot even though the
        // surviving redirect came from the later duplicate.
        assert_eq!(names, ["Newtonsoft.Json", "Serilog"]);
        Ok(())
    }

    #[test]
    fn test_tie_keeps_first_entry() -> Result<(), MigrateError> {
        let mut config = parse(
            r#"<configuration><runtime>
                 <assemblyBinding xmlns="urn:schemas-microsoft-com:asm.v1">
                   <dependentAssembly>
                     <assemblyIdentity name="A" token="first" />
                     <bindingRedirect oldVersion="0-1" newVersion="1.0" />
                   </dependentAssembly>
                   <dependentAssembly>
                     <assemblyIdentity name="A" token="second" />
                     <bindingRedirect oldVersion="0-1" newVersion="1.0.0.0" />
                   </dependentAssembly>
                 </assemblyBinding>
               </runtime></configuration>"#,
        );

        let result = merge_redirects(&mut config, config_path())?;
        assert_eq!(result.after, 1);

        let identity = config
            .first_descendant_named(config.root(), "assemblyIdentity")
            .and_then(|id| config.attribute(id, "token"));
        assert_eq!(identity, Some("first"));
        Ok(())
    }

    #[test]
    fn test_section_attributes_preserved() -> Result<(), MigrateError> {
        let mut config = parse(CONFIG);
        merge_redirects(&mut config, config_path())?;

        let section = config.first_descendant_named(config.root(), "assemblyBinding");
        let xmlns = section.and_then(|s| config.attribute(s, "xmlns"));
        assert_eq!(xmlns, Some("urn:schemas-microsoft-com:asm.v1"));
        Ok(())
    }

    #[test]
    fn test_missing_section_fails() {
        let mut config = parse("<configuration><runtime/></configuration>");
        let result = merge_redirects(&mut config, config_path());
        assert!(matches!(
            result,
            Err(MigrateError::Xml { ref path, .. }) if path == config_path()
        ));
    }

    #[test]
    fn test_unparseable_version_fails_whole_file() {
        let mut config = parse(
            r#"<configuration><runtime>
                 <assemblyBinding>
                   <dependentAssembly>
                     <assemblyIdentity name="A" />
                     <bindingRedirect oldVersion="0-1" newVersion="not.a.version" />
                   </dependentAssembly>
                 </assemblyBinding>
               </runtime></configuration>"#,
        );

        let result = merge_redirects(&mut config, config_path());
        assert!(matches!(result, Err(MigrateError::Version { .. })));
    }

    #[test]
    fn test_already_unique_entries_pass_through() -> Result<(), MigrateError> {
        let mut config = parse(
            r#"<configuration><runtime>
                 <assemblyBinding>
                   <dependentAssembly>
                     <assemblyIdentity name="A" />
                     <bindingRedirect oldVersion="0-1" newVersion="1.0" />
                   </dependentAssembly>
                 </assemblyBinding>
               </runtime></configuration>"#,
        );

        let result = merge_redirects(&mut config, config_path())?;
        assert_eq!(result, RedirectMerge { before: 1, after: 1 });
        Ok(())
    }

    #[test]
    fn test_names_are_case_sensitive() -> Result<(), MigrateError> {
        let mut config = parse(
            r#"<configuration><runtime>
                 <assemblyBinding>
                   <dependentAssembly>
                     <assemblyIdentity name="A" />
                     <bindingRedirect oldVersion="0-1" newVersion="1.0" />
                   </dependentAssembly>
                   <dependentAssembly>
                     <assemblyIdentity name="a" />
                     <bindingRedirect oldVersion="0-1" newVersion="2.0" />
                   </dependentAssembly>
                 </assemblyBinding>
               </runtime></configuration>"#,
        );

        let result = merge_redirects(&mut config, config_path())?;
        assert_eq!(result.after, 2);
        Ok(())
    }
}
