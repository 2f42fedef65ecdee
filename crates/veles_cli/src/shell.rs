//! The interactive shell: command dispatch over a design context.

use crate::graphml::parse_graphml;
use crate::lec::{check_designs, EquivResult, LecMethod};
use crate::writers;
use veles_common::Indicator;
use veles_config::ToolConfig;
use veles_opt::{ActivityEstimator, SubnetTransform};
use veles_subnet::{CellTypeDb, DesignBuilder, Subnet};
use veles_techmap::{parse_liberty, Basis, Library, Premapper, TechMapper, TechmapStats};

/// What the loop should do after a command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    /// Keep reading commands.
    Continue,
    /// Leave the shell.
    Exit,
}

/// The shell's mutable state: the current design, the loaded library, the
/// cell-type catalog, and tool configuration.
pub struct ShellContext {
    design: Option<DesignBuilder>,
    library: Option<Library>,
    types: CellTypeDb,
    config: ToolConfig,
    mapped_stats: Option<TechmapStats>,
    /// Captured command output, printed by the driver.
    pub output: String,
}

impl ShellContext {
    /// A fresh context with the given configuration.
    pub fn new(config: ToolConfig) -> Self {
        Self {
            design: None,
            library: None,
            types: CellTypeDb::new(),
            config,
            mapped_stats: None,
            output: String::new(),
        }
    }

    /// The current design, if one is loaded.
    pub fn design(&self) -> Option<&DesignBuilder> {
        self.design.as_ref()
    }

    fn design_mut(&mut self) -> Result<&mut DesignBuilder, String> {
        self.design.as_mut().ok_or_else(|| "no design loaded".to_string())
    }

    fn say(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    /// Runs one command line. Errors leave the design untouched and are
    /// reported as one-line messages with a failed status.
    pub fn run_line(&mut self, line: &str) -> Result<Flow, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };
        if command.starts_with('#') {
            return Ok(Flow::Continue);
        }
        match command {
            "read_graphml" => self.cmd_read_graphml(args),
            "read_firrtl" => Err(
                "the FIRRTL frontend is provided by an external translator; \
                 convert to GraphML first"
                    .to_string(),
            ),
            "read_liberty" => self.cmd_read_liberty(args),
            "set_name" => self.cmd_set_name(args),
            "save_point" => self.cmd_save_point(args),
            "goto_point" => self.cmd_goto_point(args),
            "list_points" => self.cmd_list_points(),
            "delete_design" => {
                self.design = None;
                self.mapped_stats = None;
                Ok(Flow::Continue)
            }
            "stat_design" => self.cmd_stat_design(),
            "logopt" => self.cmd_logopt(args),
            "techmap" => self.cmd_techmap(args),
            "unmap" => self.cmd_unmap(),
            "lec" => self.cmd_lec(args),
            "write_verilog" => self.cmd_write(args, Emit::Verilog),
            "write_dot" => self.cmd_write(args, Emit::Dot),
            "write_dataflow" => self.cmd_write(args, Emit::Dataflow),
            "write_debug" => self.cmd_write(args, Emit::Debug),
            "version" => {
                self.say(format!("veles {}", env!("CARGO_PKG_VERSION")));
                Ok(Flow::Continue)
            }
            "help" => self.cmd_help(args),
            "exit" | "quit" => Ok(Flow::Exit),
            other => Err(format!("unknown command '{other}'")),
        }
    }

    //===------------------------------------------------------------------===//
    // Frontends
    //===------------------------------------------------------------------===//

    fn cmd_read_graphml(&mut self, args: &[&str]) -> Result<Flow, String> {
        let [path] = args else {
            return Err("usage: read_graphml <path>".to_string());
        };
        let source =
            std::fs::read_to_string(path).map_err(|e| format!("cannot read '{path}': {e}"))?;
        let (subnet, name) = parse_graphml(&source).map_err(|e| e.to_string())?;
        veles_subnet::validate(&subnet).map_err(|e| e.to_string())?;
        self.say(format!(
            "loaded '{name}': {} inputs, {} outputs, {} cells",
            subnet.input_count(),
            subnet.output_count(),
            subnet.internal_count()
        ));
        self.design = Some(DesignBuilder::from_subnet(name, &subnet));
        self.mapped_stats = None;
        Ok(Flow::Continue)
    }

    fn cmd_read_liberty(&mut self, args: &[&str]) -> Result<Flow, String> {
        let [path] = args else {
            return Err("usage: read_liberty <path>".to_string());
        };
        let source =
            std::fs::read_to_string(path).map_err(|e| format!("cannot read '{path}': {e}"))?;
        let library = parse_liberty(&source).map_err(|e| e.to_string())?;
        self.say(format!(
            "library '{}': {} combinational cells",
            library.name,
            library.cells.len()
        ));
        self.library = Some(library);
        Ok(Flow::Continue)
    }

    //===------------------------------------------------------------------===//
    // Design management
    //===------------------------------------------------------------------===//

    fn cmd_set_name(&mut self, args: &[&str]) -> Result<Flow, String> {
        let [name] = args else {
            return Err("usage: set_name <str>".to_string());
        };
        let name = name.to_string();
        self.design_mut()?.set_name(name);
        Ok(Flow::Continue)
    }

    fn cmd_save_point(&mut self, args: &[&str]) -> Result<Flow, String> {
        let [tag] = args else {
            return Err("usage: save_point <tag>".to_string());
        };
        let tag = tag.to_string();
        self.design_mut()?.save_point(tag);
        Ok(Flow::Continue)
    }

    fn cmd_goto_point(&mut self, args: &[&str]) -> Result<Flow, String> {
        let [tag] = args else {
            return Err("usage: goto_point <tag>".to_string());
        };
        let tag = tag.to_string();
        self.design_mut()?
            .goto_point(&tag)
            .map_err(|e| e.to_string())?;
        Ok(Flow::Continue)
    }

    fn cmd_list_points(&mut self) -> Result<Flow, String> {
        let design = self.design.as_ref().ok_or("no design loaded")?;
        let lines: Vec<String> = design
            .list_points()
            .iter()
            .map(|tag| {
                let fingerprint = design
                    .point_fingerprint(tag)
                    .map(|h| h.to_string())
                    .unwrap_or_default();
                format!("{tag:<16} {fingerprint}")
            })
            .collect();
        for line in lines {
            self.say(line);
        }
        Ok(Flow::Continue)
    }

    fn cmd_stat_design(&mut self) -> Result<Flow, String> {
        let config = self.config.optimizer.clone();
        let design = self.design.as_mut().ok_or("no design loaded")?;
        let (n_in, n_out, n_int) = design.cell_stats();
        let depth = design.max_depth();
        let subnets = design.subnet_count();
        let name = design.name().to_string();
        let mapped = design.is_tech_mapped();

        let estimator = ActivityEstimator::with_policy(config.activity_vectors, config.activity_seed);
        let mut activity = 0.0f32;
        for builder in design.builders_mut() {
            activity += estimator.estimate(builder);
        }

        self.say(format!("Design  '{name}'"));
        self.say(format!("PIs     {n_in}"));
        self.say(format!("POs     {n_out}"));
        self.say(format!("Subnets {subnets}"));
        self.say(format!("Cells   {} (incl. PI/PO)", n_in + n_out + n_int));
        self.say(format!("        {n_int}"));
        self.say(format!("Depth   {depth}"));
        self.say(format!("SwActiv {activity:.3}"));
        if mapped {
            let stats = self.mapped_stats.unwrap_or_default();
            self.say(format!("Area    {:.3} um^2", stats.area));
            self.say(format!("Delay   {:.3} ns", stats.delay));
            self.say(format!("Power   {:.3} uW", stats.power));
        }
        Ok(Flow::Continue)
    }

    //===------------------------------------------------------------------===//
    // Optimization
    //===------------------------------------------------------------------===//

    fn cmd_logopt(&mut self, args: &[&str]) -> Result<Flow, String> {
        let Some((&pass_name, rest)) = args.split_first() else {
            return Err("usage: logopt <pass> [args]".to_string());
        };
        {
            let design = self.design.as_ref().ok_or("no design loaded")?;
            if design.is_tech_mapped() {
                return Err("not applicable to a techmapped design".to_string());
            }
        }

        // Premapping passes.
        let basis = match pass_name {
            "aig" => Some(Basis::Aig),
            "xag" => Some(Basis::Xag),
            "mig" => Some(Basis::Mig),
            "xmg" => Some(Basis::Xmg),
            _ => None,
        };
        if let Some(basis) = basis {
            let design = self.design_mut()?;
            for builder in design.builders_mut() {
                Premapper::new(basis).transform(builder);
            }
            return Ok(Flow::Continue);
        }

        // Pass options: -k <n>, -n <n> (accepted, advisory), -z.
        let mut k: Option<usize> = None;
        let mut zero_cost = false;
        let mut rest_iter = rest.iter();
        while let Some(&option) = rest_iter.next() {
            match option {
                "-k" | "-K" => {
                    let value = rest_iter
                        .next()
                        .ok_or("option -k needs a value")?
                        .parse()
                        .map_err(|_| "option -k needs an integer".to_string())?;
                    k = Some(value);
                }
                "-n" | "-N" => {
                    let _ = rest_iter.next().ok_or("option -n needs a value")?;
                }
                "-z" => zero_cost = true,
                other => return Err(format!("unknown option '{other}'")),
            }
        }

        let before = self.design.as_ref().map(|d| d.cell_stats().2).unwrap_or(0);
        let design = self.design_mut()?;
        if let Some(factory) = veles_opt::by_name(pass_name, k, zero_cost) {
            veles_opt::run_on_design(design, &factory);
        } else if !veles_opt::run_script_on_design(design, pass_name) {
            return Err(format!("unknown pass or script '{pass_name}'"));
        }
        let after = self.design.as_ref().map(|d| d.cell_stats().2).unwrap_or(0);
        self.say(format!("{pass_name}: {before} -> {after} cells"));
        Ok(Flow::Continue)
    }

    fn cmd_techmap(&mut self, args: &[&str]) -> Result<Flow, String> {
        let mut objective = Indicator::Area;
        let mut args_iter = args.iter();
        while let Some(&option) = args_iter.next() {
            match option {
                "--objective" => {
                    objective = match *args_iter.next().ok_or("--objective needs a value")? {
                        "area" => Indicator::Area,
                        "delay" => Indicator::Delay,
                        "power" => Indicator::Power,
                        other => return Err(format!("unknown objective '{other}'")),
                    };
                }
                other => return Err(format!("unknown option '{other}'")),
            }
        }

        let library = self.library.as_ref().ok_or("no liberty library loaded")?;
        let design = self.design.as_mut().ok_or("no design loaded")?;
        if design.is_tech_mapped() {
            return Err("design is already techmapped".to_string());
        }

        let mapper = TechMapper::new(library, objective);
        let mut totals = TechmapStats::default();
        let mut mapped_builders = Vec::with_capacity(design.subnet_count());
        for i in 0..design.subnet_count() {
            // Mapping runs over the AIG premapped form.
            let mut premapped = design.builder(i).clone();
            Premapper::new(Basis::Aig).transform(&mut premapped);
            let (mapped, stats) = mapper
                .map(&premapped, &mut self.types)
                .map_err(|e| e.to_string())?;
            totals.area += stats.area;
            totals.power += stats.power;
            totals.delay = totals.delay.max(stats.delay);
            mapped_builders.push(mapped);
        }
        for (i, mapped) in mapped_builders.into_iter().enumerate() {
            *design.builder_mut(i) = mapped;
        }
        self.mapped_stats = Some(totals);
        self.say(format!(
            "techmap: area {:.3}, delay {:.3}, power {:.3}",
            totals.area, totals.delay, totals.power
        ));
        Ok(Flow::Continue)
    }

    fn cmd_unmap(&mut self) -> Result<Flow, String> {
        let design = self.design.as_mut().ok_or("no design loaded")?;
        if !design.is_tech_mapped() {
            return Err("design is not techmapped".to_string());
        }
        for i in 0..design.subnet_count() {
            let plain = veles_techmap::unmap(design.builder(i), &self.types);
            *design.builder_mut(i) = plain;
        }
        self.mapped_stats = None;
        Ok(Flow::Continue)
    }

    fn cmd_lec(&mut self, args: &[&str]) -> Result<Flow, String> {
        let mut method = LecMethod::Sat;
        let mut points: Vec<&str> = Vec::new();
        let mut args_iter = args.iter();
        while let Some(&arg) = args_iter.next() {
            if arg == "--method" {
                let name = args_iter.next().ok_or("--method needs a value")?;
                method = LecMethod::parse(name)
                    .ok_or_else(|| format!("unknown method '{name}'"))?;
            } else {
                points.push(arg);
            }
        }
        let [p1, p2] = points.as_slice() else {
            return Err("no points specified".to_string());
        };
        if p1 == p2 {
            return Err("equal points specified".to_string());
        }
        let design = self.design.as_ref().ok_or("no design loaded")?;
        for point in [p1, p2] {
            if !design.has_point(point) {
                return Err(format!("unknown point '{point}'"));
            }
        }
        let left: Vec<Subnet> = design.point_subnets(p1).map_err(|e| e.to_string())?;
        let right: Vec<Subnet> = design.point_subnets(p2).map_err(|e| e.to_string())?;
        match check_designs(&left, &right, method) {
            EquivResult::Equal => {
                self.say(format!("Passed: {p1} == {p2}"));
                Ok(Flow::Continue)
            }
            EquivResult::NotEqual => {
                self.say(format!("Failed: {p1} != {p2}"));
                Err("check failed".to_string())
            }
            EquivResult::Unknown => {
                self.say(format!("Unknown: {p1} ?= {p2}"));
                Err("check inconclusive".to_string())
            }
        }
    }

    //===------------------------------------------------------------------===//
    // Writers
    //===------------------------------------------------------------------===//

    fn cmd_write(&mut self, args: &[&str], emit: Emit) -> Result<Flow, String> {
        let [path] = args else {
            return Err(format!("usage: {} <path>", emit.command()));
        };
        let design = self.design.as_ref().ok_or("no design loaded")?;
        let text = match emit {
            Emit::Verilog => {
                let subnet = design.builder(0).make(true);
                writers::write_verilog(&subnet, design.name(), &self.types)
            }
            Emit::Dot => {
                let subnet = design.builder(0).make(true);
                writers::write_dot(&subnet, design.name())
            }
            Emit::Dataflow => writers::write_dataflow(design),
            Emit::Debug => writers::write_debug(design),
        };
        std::fs::write(path, text).map_err(|e| format!("cannot write '{path}': {e}"))?;
        Ok(Flow::Continue)
    }

    fn cmd_help(&mut self, args: &[&str]) -> Result<Flow, String> {
        let commands: &[(&str, &str)] = &[
            ("read_graphml <path>", "load a GraphML netlist"),
            ("read_firrtl <path>", "FIRRTL input (external translator)"),
            ("read_liberty <path>", "load a liberty library"),
            ("set_name <str>", "rename the current design"),
            ("save_point <tag>", "snapshot the design"),
            ("goto_point <tag>", "restore a snapshot"),
            ("list_points", "list snapshot tags"),
            ("delete_design", "drop the current design"),
            ("stat_design", "print design characteristics"),
            ("logopt <pass>", "run an optimization pass or script"),
            ("techmap [--objective area|delay|power]", "map to the library"),
            ("unmap", "undo technology mapping"),
            ("lec [--method bdd|fra|rnd|sat] <p1> <p2>", "check equivalence"),
            ("write_verilog <path>", "emit structural Verilog"),
            ("write_dot <path>", "emit a DOT graph"),
            ("write_dataflow <path>", "emit the dataflow listing"),
            ("write_debug <path>", "emit a JSON debug dump"),
            ("version", "print the version"),
            ("help [cmd]", "this text"),
            ("exit", "leave the shell"),
        ];
        match args.first() {
            Some(&wanted) => {
                for (name, text) in commands {
                    if name.starts_with(wanted) {
                        self.say(format!("{name:<44} {text}"));
                        return Ok(Flow::Continue);
                    }
                }
                Err(format!("unknown command '{wanted}'"))
            }
            None => {
                for (name, text) in commands {
                    self.say(format!("{name:<44} {text}"));
                }
                Ok(Flow::Continue)
            }
        }
    }
}

enum Emit {
    Verilog,
    Dot,
    Dataflow,
    Debug,
}

impl Emit {
    fn command(&self) -> &'static str {
        match self {
            Emit::Verilog => "write_verilog",
            Emit::Dot => "write_dot",
            Emit::Dataflow => "write_dataflow",
            Emit::Debug => "write_debug",
        }
    }
}
