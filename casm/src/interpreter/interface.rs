use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use casm_common::NUM_REGISTERS;
use ratatui::crossterm::event;
use ratatui::crossterm::event::{Event as TermEvent, KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;
use ratatui::DefaultTerminal;
use tui_textarea::{CursorMove, TextArea};

use super::event::Event;
use super::machine::Interpreter;

/// Cells touched by the most recent step. This is what the renderer
/// animates: it is filled purely from the machine's event stream.
#[derive(Debug, Default)]
struct Activity {
    registers: HashSet<usize>,
    memory: HashSet<usize>,
    storage: HashSet<usize>,
}

impl Activity {
    fn clear(&mut self) {
        self.registers.clear();
        self.memory.clear();
        self.storage.clear();
    }

    fn apply(&mut self, event: &Event) {
        match event {
            Event::RegisterChanged { index, .. } => {
                self.registers.insert(*index);
            }
            Event::MemoryChanged { word_index, .. } => {
                self.memory.insert(*word_index);
            }
            Event::StorageChanged { word_index, .. } => {
                self.storage.insert(*word_index);
            }
            Event::PcChanged { .. } | Event::Halted | Event::Errored { .. } => {}
        }
    }
}

#[derive(Debug)]
pub struct TerminalInterface<'a> {
    interpreter: Interpreter,
    should_exit: bool,

    // State
    program_textarea: TextArea<'a>,
    activity: Rc<RefCell<Activity>>,
    memory_state: ListState,
    storage_state: ListState,
    vm_on: bool,
    loaded: bool,
}

// See other impl for rendering logic
impl TerminalInterface<'_> {
    pub fn new(program: Option<String>) -> Self {
        // Textarea styling
        let mut program_textarea = match program {
            Some(program) => TextArea::from(program.lines()),
            None => TextArea::default(),
        };
        let textarea_block = Block::bordered().title("Program");
        program_textarea.set_block(textarea_block);
        program_textarea.set_line_number_style(Style::default().fg(Color::DarkGray));
        program_textarea.set_cursor_line_style(Style::default());

        let mut interpreter = Interpreter::new();
        let activity = Rc::new(RefCell::new(Activity::default()));
        let sink = activity.clone();
        interpreter.subscribe(move |event| sink.borrow_mut().apply(event));

        Self {
            interpreter,
            should_exit: false,
            program_textarea,
            activity,
            memory_state: ListState::default(),
            storage_state: ListState::default(),
            vm_on: false,
            loaded: false,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) {
        while !self.should_exit {
            terminal.draw(|frame| frame.render_widget(&mut self, frame.area())).unwrap();
            // Do not block long when there aren't any events to read
            if let Ok(true) = event::poll(core::time::Duration::from_millis(16)) {
                if let TermEvent::Key(event) = event::read().unwrap() {
                    self.handle_key(event);
                }
            }

            // Step the vm, if on
            if self.vm_on && !self.step_vm() {
                self.vm_on = false;
            }
        }
    }

    fn load_program(&mut self) {
        self.activity.borrow_mut().clear();
        let lines = self.program_textarea.lines().to_vec();
        self.loaded = self.interpreter.load(&lines).is_ok();
    }

    /// One machine step; returns whether the machine can keep going.
    fn step_vm(&mut self) -> bool {
        self.activity.borrow_mut().clear();
        matches!(self.interpreter.step(), Ok(true))
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.should_exit = true;
        }

        if key.modifiers.contains(event::KeyModifiers::ALT) {
            // Alt + ... keys
            // i.e., selection key combos

            if !self.program_textarea.is_selecting() {
                self.program_textarea.start_selection()
            }

            match key.code {
                KeyCode::Left => {
                    self.program_textarea.move_cursor(CursorMove::Back);
                }
                KeyCode::Right => {
                    self.program_textarea.move_cursor(CursorMove::Forward);
                }
                _ => {} // No-op
            }
        }

        if key.modifiers.contains(event::KeyModifiers::CONTROL) {
            // Ctrl + ... keys
            match key.code {
                KeyCode::Left => {
                    self.program_textarea.move_cursor(CursorMove::WordBack);
                }
                KeyCode::Right => {
                    self.program_textarea.move_cursor(CursorMove::WordForward);
                }

                KeyCode::Char('a') => {
                    self.program_textarea.select_all();
                }
                KeyCode::Char('c') => {
                    self.program_textarea.copy();
                }
                KeyCode::Char('x') => {
                    self.program_textarea.cut();
                }
                KeyCode::Char('p') => {
                    self.program_textarea.paste();
                }
                KeyCode::Char('r') => {
                    // Load the program and let it run
                    self.load_program();
                    self.vm_on = self.loaded;
                }
                KeyCode::Char('s') => {
                    // Single step, loading first when needed
                    self.vm_on = false;
                    if !self.loaded {
                        self.load_program();
                    }
                    if self.loaded {
                        self.step_vm();
                    }
                }
                KeyCode::Char('n') => {
                    if !self.vm_on {
                        // Back to a blank machine
                        self.interpreter.load::<&str>(&[]).ok();
                        self.activity.borrow_mut().clear();
                        self.loaded = false;
                    }
                }
                _ => {} // No-op
            }
        } else {
            // Otherwise send input to the textarea
            self.program_textarea.input(key);
        }
    }
}

// Allow TerminalInterface to be rendered
impl Widget for &mut TerminalInterface<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [header_area, main_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(4),
        ])
        .areas(area);

        let [program_area, machine_area, memory_area, storage_area] = Layout::horizontal([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .areas(main_area);

        self.render_header(header_area, buf);
        self.render_program(program_area, buf);
        self.render_machine(machine_area, buf);
        self.render_memory(memory_area, buf);
        self.render_storage(storage_area, buf);
        self.render_footer(footer_area, buf);
    }
}

const HIGHLIGHT: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);

// Rendering methods
impl TerminalInterface<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(vec!["casm".bold().into_centered_line()])
            .block(Block::bordered())
            .render(area, buf);
    }

    fn render_program(&self, area: Rect, buf: &mut Buffer) {
        self.program_textarea.render(area, buf);
    }

    fn render_machine(&self, area: Rect, buf: &mut Buffer) {
        let outer_block = Block::bordered().title("Machine");
        let [status_area, stats_area, registers_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .areas(outer_block.inner(area));

        let status = if self.vm_on {
            "VM ON".bold().fg(Color::Green)
        } else if self.interpreter.error().is_some() {
            "ERROR".bold().fg(Color::Red)
        } else if self.interpreter.halted() {
            "HALTED".bold().fg(Color::Blue)
        } else {
            "VM OFF".bold().fg(Color::Red)
        };
        Paragraph::new(vec![status.into()]).render(status_area, buf);

        let [pc_area, cycles_area, jumps_area] = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .areas(stats_area);
        Paragraph::new(vec![format!("{}", self.interpreter.pc()).into()])
            .block(Block::bordered().title("PC"))
            .render(pc_area, buf);
        Paragraph::new(vec![format!("{}", self.interpreter.cycles()).into()])
            .block(Block::bordered().title("Cycles"))
            .render(cycles_area, buf);
        Paragraph::new(vec![format!("{}", self.interpreter.num_label_jumps()).into()])
            .block(Block::bordered().title("Jumps"))
            .render(jumps_area, buf);

        let activity = self.activity.borrow();
        let registers = self.interpreter.registers();
        let items: Vec<ListItem> = (1..NUM_REGISTERS)
            .map(|i| {
                let line = format!("R{}: {}", i, registers[i]);
                if activity.registers.contains(&i) {
                    ListItem::new(line).style(HIGHLIGHT)
                } else {
                    ListItem::new(line)
                }
            })
            .collect();
        ratatui::widgets::Widget::render(
            List::new(items).block(Block::bordered().title("Registers")),
            registers_area,
            buf,
        );

        outer_block.render(area, buf);
    }

    fn render_memory(&mut self, area: Rect, buf: &mut Buffer) {
        let pc = self.interpreter.pc();
        let activity = self.activity.borrow();
        let items: Vec<ListItem> = self
            .interpreter
            .memory()
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let pointer = if i == pc { '>' } else { ' ' };
                let line = format!("{pointer}0x{:02X}: {}", i * 4, cell.as_deref().unwrap_or(""));
                let item = ListItem::new(line);
                if activity.memory.contains(&i) {
                    item.style(HIGHLIGHT)
                } else if i == pc {
                    item.style(Style::default().fg(Color::Blue))
                } else {
                    item
                }
            })
            .collect();
        drop(activity);

        // Keep the program counter row in view
        let last = self.interpreter.memory().len() - 1;
        self.memory_state.select(Some(pc.min(last)));
        let list = List::new(items).block(Block::bordered().title("Memory"));
        StatefulWidget::render(list, area, buf, &mut self.memory_state);
    }

    fn render_storage(&mut self, area: Rect, buf: &mut Buffer) {
        let activity = self.activity.borrow();
        let items: Vec<ListItem> = self
            .interpreter
            .storage()
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let line = format!(" 0x{:02X}: {}", i * 4, cell.as_deref().unwrap_or(""));
                if activity.storage.contains(&i) {
                    ListItem::new(line).style(HIGHLIGHT)
                } else {
                    ListItem::new(line)
                }
            })
            .collect();
        if let Some(&changed) = activity.storage.iter().next() {
            self.storage_state.select(Some(changed));
        }
        drop(activity);

        let list = List::new(items).block(Block::bordered().title("Storage"));
        StatefulWidget::render(list, area, buf, &mut self.storage_state);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        let content = match self.interpreter.error_report() {
            Some(report) => Paragraph::new(report).style(Style::default().fg(Color::Red)),
            None => Paragraph::new("Ctrl+R run  Ctrl+S step  Ctrl+N reset  Esc quit")
                .style(Style::default().fg(Color::DarkGray)),
        };
        content.block(Block::bordered()).render(area, buf);
    }
}
