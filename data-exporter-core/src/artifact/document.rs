//! Vault package metadata documents.
//!
//! Every file under `META-INF/vault` plus the root `.content.xml` is one
//! [`VaultDocument`] variant. The variants differ only in what they render
//! from the shared [`PackageContext`].

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::PACKAGE_GROUP;
use crate::error::{ArtifactError, ArtifactResult};

const VAULT_CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vaultfs version="1.1">
    <aggregates>
        <aggregate type="file" title="Files"/>
        <aggregate type="filefolder" title="Folders"/>
        <aggregate type="nodetype" title="Node Types"/>
        <aggregate type="full" title="Full Coverage">
            <matches>
                <include nodeType="rep:AccessControl" respectSupertype="true"/>
                <include nodeType="cq:Widget" respectSupertype="true"/>
                <include nodeType="cq:EditConfig" respectSupertype="true"/>
                <include nodeType="cq:WorkflowModel" respectSupertype="true"/>
                <include nodeType="vlt:FullCoverage" respectSupertype="true"/>
                <include nodeType="mix:language" respectSupertype="true"/>
                <include nodeType="sling:OsgiConfig" respectSupertype="true"/>
            </matches>
        </aggregate>
        <aggregate type="generic" title="Folders">
            <matches>
                <include nodeType="nt:folder" respectSupertype="true"/>
            </matches>
            <contains>
                <exclude isNode="true"/>
            </contains>
        </aggregate>
        <aggregate type="generic" title="Default"/>
    </aggregates>
    <handlers>
        <handler type="folder"/>
        <handler type="file"/>
        <handler type="nodetype"/>
        <handler type="generic"/>
    </handlers>
</vaultfs>
"#;

const NODE_TYPES: &str = "<'nt'='http://www.jcp.org/jcr/nt/1.0'>\n<'jcr'='http://www.jcp.org/jcr/1.0'>\n";

/// Inputs shared by all documents of one package.
#[derive(Debug, Clone)]
pub struct PackageContext<'a> {
    pub paths: &'a [String],
    pub username: &'a str,
    pub package_name: &'a str,
    pub timestamp: DateTime<Utc>,
}

impl<'a> PackageContext<'a> {
    pub fn new(paths: &'a [String], username: &'a str, package_name: &'a str) -> Self {
        Self {
            paths,
            username,
            package_name,
            timestamp: Utc::now(),
        }
    }

    fn timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultDocument {
    /// `definition/.content.xml`: the `vlt:PackageDefinition` node.
    Definition,
    /// `filter.xml`: one filter root per content path.
    Filter,
    /// `properties.xml`: package properties in java properties XML.
    Properties,
    Config,
    NodeTypes,
    RootContent,
}

impl VaultDocument {
    pub const ALL: [VaultDocument; 6] = [
        VaultDocument::Definition,
        VaultDocument::Config,
        VaultDocument::Filter,
        VaultDocument::NodeTypes,
        VaultDocument::Properties,
        VaultDocument::RootContent,
    ];

    /// Path of the document inside the package.
    pub fn entry_name(self) -> &'static str {
        match self {
            VaultDocument::Definition => "META-INF/vault/definition/.content.xml",
            VaultDocument::Filter => "META-INF/vault/filter.xml",
            VaultDocument::Properties => "META-INF/vault/properties.xml",
            VaultDocument::Config => "META-INF/vault/config.xml",
            VaultDocument::NodeTypes => "META-INF/vault/nodetypes.cnd",
            VaultDocument::RootContent => "jcr_root/.content.xml",
        }
    }

    pub fn render(self, context: &PackageContext<'_>) -> ArtifactResult<Vec<u8>> {
        match self {
            VaultDocument::Definition => render_definition(context),
            VaultDocument::Filter => render_filter(context),
            VaultDocument::Properties => render_properties(context),
            VaultDocument::Config => Ok(VAULT_CONFIG.as_bytes().to_vec()),
            VaultDocument::NodeTypes => Ok(NODE_TYPES.as_bytes().to_vec()),
            VaultDocument::RootContent => render_root_content(),
        }
    }
}

struct XmlDocument {
    writer: Writer<Vec<u8>>,
    name: &'static str,
}

impl XmlDocument {
    fn new(name: &'static str) -> ArtifactResult<Self> {
        let mut document = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 4),
            name,
        };
        document.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(document)
    }

    fn event(&mut self, event: Event<'_>) -> ArtifactResult<()> {
        let name = self.name;
        self.writer
            .write_event(event)
            .map_err(|e| ArtifactError::Render {
                document: name,
                message: e.to_string(),
            })
    }

    fn text_element(&mut self, start: BytesStart<'_>, text: &str) -> ArtifactResult<()> {
        let end = start.to_end().into_owned();
        self.event(Event::Start(start))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.event(Event::End(end))
    }

    fn finish(self) -> Vec<u8> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        bytes
    }
}

fn render_definition(context: &PackageContext<'_>) -> ArtifactResult<Vec<u8>> {
    let timestamp = format!("{{Date}}{}", context.timestamp());
    let mut document = XmlDocument::new("definition/.content.xml")?;
    let mut root = BytesStart::new("jcr:root");
    root.push_attribute(("xmlns:vlt", "http://www.day.com/jcr/vault/1.0"));
    root.push_attribute(("xmlns:jcr", "http://www.jcp.org/jcr/1.0"));
    root.push_attribute(("xmlns:nt", "http://www.jcp.org/jcr/nt/1.0"));
    root.push_attribute(("jcr:created", timestamp.as_str()));
    root.push_attribute(("jcr:createdBy", context.username));
    root.push_attribute(("jcr:lastModified", timestamp.as_str()));
    root.push_attribute(("jcr:lastModifiedBy", context.username));
    root.push_attribute(("jcr:primaryType", "vlt:PackageDefinition"));
    root.push_attribute(("buildCount", "1"));
    root.push_attribute(("group", PACKAGE_GROUP));
    root.push_attribute(("lastUnwrapped", timestamp.as_str()));
    root.push_attribute(("lastUnwrappedBy", context.username));
    root.push_attribute(("lastWrapped", timestamp.as_str()));
    root.push_attribute(("lastWrappedBy", context.username));
    root.push_attribute(("name", context.package_name));
    root.push_attribute(("version", ""));
    document.event(Event::Empty(root))?;
    Ok(document.finish())
}

fn render_filter(context: &PackageContext<'_>) -> ArtifactResult<Vec<u8>> {
    let mut document = XmlDocument::new("filter.xml")?;
    let mut root = BytesStart::new("workspaceFilter");
    root.push_attribute(("version", "1.0"));
    document.event(Event::Start(root))?;
    for path in context.paths {
        let mut filter = BytesStart::new("filter");
        filter.push_attribute(("root", path.as_str()));
        document.event(Event::Empty(filter))?;
    }
    document.event(Event::End(BytesEnd::new("workspaceFilter")))?;
    Ok(document.finish())
}

fn render_properties(context: &PackageContext<'_>) -> ArtifactResult<Vec<u8>> {
    let timestamp = context.timestamp();
    let entries = [
        ("createdBy", context.username),
        ("name", context.package_name),
        ("lastModified", timestamp.as_str()),
        ("lastModifiedBy", context.username),
        ("created", timestamp.as_str()),
        ("buildCount", "1"),
        ("packageFormatVersion", "2"),
        ("group", PACKAGE_GROUP),
        ("lastWrapped", timestamp.as_str()),
        ("lastWrappedBy", context.username),
    ];

    let mut document = XmlDocument::new("properties.xml")?;
    document.event(Event::DocType(BytesText::from_escaped(
        r#"properties SYSTEM "http://java.sun.com/dtd/properties.dtd""#,
    )))?;
    document.event(Event::Start(BytesStart::new("properties")))?;
    document.text_element(BytesStart::new("comment"), "FileVault Package Properties")?;
    for (key, value) in entries {
        let mut entry = BytesStart::new("entry");
        entry.push_attribute(("key", key));
        document.text_element(entry, value)?;
    }
    for key in ["version", "dependencies"] {
        let mut entry = BytesStart::new("entry");
        entry.push_attribute(("key", key));
        document.event(Event::Empty(entry))?;
    }
    document.event(Event::End(BytesEnd::new("properties")))?;
    Ok(document.finish())
}

fn render_root_content() -> ArtifactResult<Vec<u8>> {
    let mut document = XmlDocument::new("jcr_root/.content.xml")?;
    let mut root = BytesStart::new("jcr:root");
    root.push_attribute(("xmlns:jcr", "http://www.jcp.org/jcr/1.0"));
    root.push_attribute(("xmlns:rep", "internal"));
    root.push_attribute(("jcr:primaryType", "rep:root"));
    document.event(Event::Empty(root))?;
    Ok(document.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context<'a>(paths: &'a [String]) -> PackageContext<'a> {
        PackageContext {
            paths,
            username: "admin",
            package_name: "site_1",
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        }
    }

    fn rendered(document: VaultDocument, paths: &[String]) -> String {
        String::from_utf8(document.render(&context(paths)).unwrap()).unwrap()
    }

    #[test]
    fn filter_lists_every_path_in_order() {
        let paths = vec!["/content/site/home".to_owned(), "/content/dam/a&b.png".to_owned()];
        let xml = rendered(VaultDocument::Filter, &paths);
        let home = xml.find(r#"<filter root="/content/site/home"/>"#).unwrap();
        let asset = xml.find(r#"<filter root="/content/dam/a&amp;b.png"/>"#).unwrap();
        assert!(home < asset);
        assert!(xml.contains(r#"<workspaceFilter version="1.0">"#));
    }

    #[test]
    fn definition_records_creator_group_and_timestamp() {
        let xml = rendered(VaultDocument::Definition, &[]);
        assert!(xml.contains(r#"jcr:createdBy="admin""#));
        assert!(xml.contains(r#"group="data_exporter_packages""#));
        assert!(xml.contains(r#"name="site_1""#));
        assert!(xml.contains(r#"jcr:created="{Date}2024-03-01T12:30:00.000Z""#));
    }

    #[test]
    fn properties_carry_doctype_and_entries() {
        let xml = rendered(VaultDocument::Properties, &[]);
        assert!(xml.contains("<!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">"));
        assert!(xml.contains(r#"<entry key="name">site_1</entry>"#));
        assert!(xml.contains(r#"<entry key="created">2024-03-01T12:30:00.000Z</entry>"#));
        assert!(xml.contains(r#"<entry key="dependencies"/>"#));
    }
}
