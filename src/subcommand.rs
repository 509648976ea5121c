//! Sub-command nodes of a command tree.

use tracing::{debug, instrument};

use crate::declaration::CommandSpec;
use crate::errors::ConfigurationResult;
use crate::formatter::Formatter;
use crate::meta::{self, MetaRecord, SUBCOMMAND_ATTRIBUTES};
use crate::node::{Node, SubcommandGroup, HELP_ID};

/// A named, nestable child of a [`crate::Command`] with its own arguments and handler.
pub struct SubCommand {
    meta: MetaRecord,
    aliases: Vec<String>,
    node: Node,
}

impl SubCommand {
    /// Build the sub-command declared by `spec` and register it in `group`.
    ///
    /// Children declared by `spec` are built recursively, in declared order, into a
    /// nested group keyed by this sub-command's name.
    ///
    /// # Errors
    ///
    /// Any [`crate::ConfigurationError`] found in `spec` or its descendants.
    #[instrument(level = "debug", skip_all, fields(parent = group.parent()))]
    pub fn new(
        spec: &CommandSpec,
        group: &mut SubcommandGroup,
        formatter: &Formatter,
    ) -> ConfigurationResult<Self> {
        let owner = format!("sub-command of '{}'", group.parent());
        let meta = meta::collect(spec, SUBCOMMAND_ATTRIBUTES, &owner)?;
        let name = meta.name()?.to_string();
        let aliases = meta.list("aliases")?.to_vec();
        group.reserve(&name, &aliases)?;

        let mut parser = clap::Command::new(name.clone()).visible_aliases(aliases.clone());
        if let Some(help) = meta.text("help")? {
            parser = parser.about(help.to_string());
        }
        if let Some(description) = meta.text("description")? {
            parser = parser.long_about(description.to_string());
        }

        let (parser, bindings) = Node::register_arguments(
            parser,
            &name,
            meta.arguments("arguments")?,
            formatter,
            &[HELP_ID],
        )?;
        let (parser, children) =
            Node::register_subcommands(parser, &name, meta.commands("subcommands")?, formatter)?;
        group.push(parser);

        let group_dest = (!children.is_empty()).then(|| name.clone());
        debug!(name = %name, aliases = ?aliases, children = children.len(), "sub-command registered");
        Ok(Self {
            meta,
            aliases,
            node: Node::new(name, bindings, spec.handler.clone(), children, group_dest),
        })
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn meta(&self) -> &MetaRecord {
        &self.meta
    }

    pub fn subcommands(&self) -> &[SubCommand] {
        self.node.children()
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }
}
