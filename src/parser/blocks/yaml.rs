//! YAML front matter: a `---` line at the very start of the file (only
//! blank lines may precede it), closed by `---` or `...` at column zero.

use std::cell::RefCell;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Item, NodeRef, Pos, YamlHeader};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{is_empty_line, skip_spaces};

const START_DELIM: &str = "---";
const END_DELIM: &str = "...";

#[derive(Default)]
pub struct YamlParser {
    yaml: RefCell<Option<NodeRef<YamlHeader>>>,
}

impl YamlParser {
    pub fn new() -> Self {
        YamlParser::default()
    }
}

impl BlockParser for YamlParser {
    fn kind(&self) -> BlockKind {
        BlockKind::Yaml
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
        dry_run: bool,
    ) -> BlockState {
        let s_state = stream.current_state();
        let l_state = line.current_state();

        let restore = |line: &mut Line, stream: &mut TextStream| {
            stream.restore_state(&s_state);
            *line = stream.current_line();
            line.restore_state(&l_state);
        };

        skip_spaces(line);

        if line.trimmed() == START_DELIM && line.position() == 0 && l_state.pos == 0 {
            // The opener must be at the top of the file, blank lines aside.
            if line.line_number() != 0 {
                let mut probe = stream.move_to(0);

                while probe.line_number() < line.line_number() {
                    if !is_empty_line(&mut probe) {
                        restore(line, stream);

                        return BlockState::None;
                    }

                    probe = stream.read_line();
                }
            }

            while !stream.at_end() {
                *line = stream.read_line();
                let str = line.trimmed();

                let tmp_state = line.current_state();
                skip_spaces(line);
                let ns = line.position();
                line.restore_state(&tmp_state);

                if (str == START_DELIM || str == END_DELIM) && line.position() == 0 && ns == 0 {
                    if dry_run {
                        restore(line, stream);
                    } else {
                        line.skip();
                    }

                    return BlockState::Stop;
                }
            }
        }

        restore(line, stream);

        BlockState::None
    }

    fn continue_check(
        &self,
        _line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        BlockState::None
    }

    fn process(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        parent: Option<&BlockRef>,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        let existing = self.yaml.borrow().clone();

        match existing {
            None => {
                if is_empty_line(line) {
                    line.skip();

                    return BlockState::Continue;
                }

                let yaml = node(YamlHeader {
                    pos: Pos::new(line.position(), line.line_number(), -1, -1),
                    yaml: String::new(),
                    start_delim: Pos::new(
                        line.position(),
                        line.line_number(),
                        line.length() - 1,
                        line.line_number(),
                    ),
                    end_delim: Pos::null(),
                });

                if let Some(parent) = parent {
                    parent.append_item(Item::YamlHeader(yaml.clone()));
                }

                *self.yaml.borrow_mut() = Some(yaml);

                BlockState::Continue
            }
            Some(yaml) => {
                let str = line.trimmed();

                if str == START_DELIM || str == END_DELIM {
                    let mut y = yaml.borrow_mut();
                    y.end_delim = Pos::new(
                        line.position(),
                        line.line_number(),
                        line.length() - 1,
                        line.line_number(),
                    );
                    y.pos.end_col = line.length() - 1;
                    y.pos.end_line = line.line_number();

                    line.skip();

                    return BlockState::Stop;
                }

                let mut y = yaml.borrow_mut();

                if !y.yaml.is_empty() {
                    y.yaml.push('\n');
                }

                let body = line.sliced_copy_to_end(0);
                y.yaml.push_str(&body);

                BlockState::Continue
            }
        }
    }

    fn reset(&self, _tree: &mut ContextTree, _ctx: CtxId) {
        self.reset_on_all_contexts();
    }

    fn reset_on_all_contexts(&self) {
        *self.yaml.borrow_mut() = None;
    }

    fn may_break_paragraph(
        &self,
        _line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        false
    }

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
