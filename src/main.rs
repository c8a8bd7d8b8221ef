use anyhow::{bail, Context, Result};
use golf_scoring_db::{
    cli::{
        Cli, Commands, GroupCommand, HoleCommand, PlayerCommand, ScoreCommand, SettingCommand,
        TournamentCommand,
    },
    config::DataLocation,
    models::{NewGroup, NewHole, NewPlayer, NewTournament},
    schema::DependencyResolver,
    Database, Leaderboard,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();
    let location = DataLocation::new(cli.db)?;
    let mut db = Database::open(location.db_path())
        .with_context(|| format!("Failed to open database {:?}", location.db_path()))?;

    match cli.command {
        Commands::Init => {
            println!("Database ready at {:?}", location.db_path());
        }

        Commands::Tables => {
            let resolver = DependencyResolver::new();
            let tables = resolver.creation_order().map_err(anyhow::Error::msg)?;
            for table in tables {
                let cascades = resolver
                    .cascade_targets(table.name)
                    .map_err(anyhow::Error::msg)?;
                if cascades.is_empty() {
                    println!("  {}", table.name);
                } else {
                    println!("  {:<20} delete cascades to: {}", table.name, cascades.join(", "));
                }
            }
        }

        Commands::Player(cmd) => run_player(&db, cmd)?,
        Commands::Tournament(cmd) => run_tournament(&mut db, cmd)?,
        Commands::Hole(cmd) => run_hole(&mut db, cmd)?,

        Commands::Enter { tournament, player } => {
            db.enter_player(tournament, player)?;
            println!("Entered {} into {}", player, tournament);
        }

        Commands::Group(cmd) => run_group(&mut db, cmd)?,
        Commands::Score(cmd) => run_score(&db, cmd)?,
        Commands::Setting(cmd) => run_setting(&db, cmd)?,

        Commands::Leaderboard { tournament, json } => {
            let tournament_id = match tournament {
                Some(id) => id,
                None => match db.active_tournament()? {
                    Some(active) => active.id,
                    None => bail!("No active tournament; pass a tournament id"),
                },
            };
            let board = db.leaderboard(tournament_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_leaderboard(&board);
            }
        }
    }

    Ok(())
}

/// Log to stderr, filtered by RUST_LOG (warnings only by default)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_player(db: &Database, cmd: PlayerCommand) -> Result<()> {
    match cmd {
        PlayerCommand::Add {
            name,
            handicap,
            reference,
        } => {
            let mut new = NewPlayer::new(name, handicap);
            new.handicap_reference = reference;
            let player = db.create_player(&new)?;
            println!("{}", player.id);
        }
        PlayerCommand::List => {
            for p in db.list_players()? {
                println!("{}  {:<24} {:>5.1}", p.id, p.name, p.handicap_index);
            }
        }
        PlayerCommand::Delete { id } => {
            db.delete_player(id)?;
            println!("Deleted player {}", id);
        }
    }
    Ok(())
}

fn run_tournament(db: &mut Database, cmd: TournamentCommand) -> Result<()> {
    match cmd {
        TournamentCommand::Add(args) => {
            let mut new = NewTournament::new(args.name, args.year, args.course);
            new.slope_rating = args.slope;
            new.course_rating = args.rating;
            new.start_date = args.start;
            new.end_date = args.end;
            new.is_active = args.active;
            let tournament = db.create_tournament(&new)?;
            println!("{}", tournament.id);
        }
        TournamentCommand::List => {
            for t in db.list_tournaments()? {
                let marker = if t.is_active { "*" } else { " " };
                println!(
                    "{} {}  {} {:<24} {:<20} {}",
                    marker, t.id, t.year, t.name, t.course_name, t.status
                );
            }
        }
        TournamentCommand::Activate { id } => {
            let t = db.activate_tournament(id)?;
            println!("Active tournament: {} ({})", t.name, t.id);
        }
        TournamentCommand::Deactivate { id } => {
            let t = db.deactivate_tournament(id)?;
            println!("Deactivated {} ({})", t.name, t.id);
        }
        TournamentCommand::Status { id, status } => {
            let t = db.set_tournament_status(id, status)?;
            println!("{} is now {}", t.name, t.status);
        }
        TournamentCommand::Delete { id } => {
            db.delete_tournament(id)?;
            println!("Deleted tournament {}", id);
        }
    }
    Ok(())
}

fn run_hole(db: &mut Database, cmd: HoleCommand) -> Result<()> {
    match cmd {
        HoleCommand::Add {
            tournament,
            number,
            par,
            stroke_index,
        } => {
            let hole = db.add_hole(tournament, &NewHole::new(number, par, stroke_index))?;
            println!("{}", hole.id);
        }
        HoleCommand::Bulk {
            tournament,
            pars,
            stroke_indexes,
        } => {
            if pars.len() != stroke_indexes.len() {
                bail!(
                    "Got {} pars but {} stroke indexes",
                    pars.len(),
                    stroke_indexes.len()
                );
            }
            let holes: Vec<NewHole> = pars
                .iter()
                .zip(&stroke_indexes)
                .enumerate()
                .map(|(i, (&par, &si))| {
                    let number = u8::try_from(i + 1).context("Too many holes")?;
                    Ok(NewHole::new(number, par, si))
                })
                .collect::<Result<_>>()?;
            let stored = db.add_holes(tournament, &holes)?;
            println!("Added {} holes", stored.len());
        }
        HoleCommand::List { tournament } => {
            for h in db.list_holes(tournament)? {
                println!("{:>2}  par {}  SI {:>2}", h.hole_number, h.par, h.stroke_index);
            }
            let shared = db.duplicate_stroke_indexes(tournament)?;
            if !shared.is_empty() {
                println!("Note: stroke index shared by several holes: {:?}", shared);
            }
        }
    }
    Ok(())
}

fn run_group(db: &mut Database, cmd: GroupCommand) -> Result<()> {
    match cmd {
        GroupCommand::Add {
            tournament,
            number,
            name,
            tee_time,
            pin,
        } => {
            let group = db.create_group(
                tournament,
                &NewGroup {
                    group_number: number,
                    name,
                    tee_time,
                    pin,
                },
            )?;
            println!("{}  pin {}", group.id, group.pin);
        }
        GroupCommand::List { tournament } => {
            for g in db.list_groups(tournament)? {
                let tee = g
                    .tee_time
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| "--:--".to_string());
                println!(
                    "{:>3}  {}  {}  pin {}  {}",
                    g.group_number,
                    tee,
                    g.id,
                    g.pin,
                    g.name.as_deref().unwrap_or("")
                );
            }
        }
        GroupCommand::Join {
            group,
            player,
            scorer,
        } => {
            db.add_group_member(group, player, scorer)?;
            println!("Added {} to group {}", player, group);
        }
    }
    Ok(())
}

fn run_score(db: &Database, cmd: ScoreCommand) -> Result<()> {
    match cmd {
        ScoreCommand::Record {
            tournament,
            player,
            hole_number,
            gross,
            replace,
        } => {
            let hole = db.hole_by_number(tournament, hole_number)?;
            let score = if replace {
                db.upsert_score(tournament, player, hole.id, gross)?
            } else {
                db.record_score(tournament, player, hole.id, gross)?
            };
            println!("Hole {}: {}", hole_number, score.gross_score);
        }
        ScoreCommand::List { tournament, player } => match player {
            Some(player) => {
                for (hole, gross) in db.player_card(tournament, player)? {
                    println!("{:>2}  {}", hole, gross);
                }
            }
            None => {
                for s in db.list_scores(tournament)? {
                    println!("{}  {}  {}", s.player_id, s.hole_id, s.gross_score);
                }
            }
        },
    }
    Ok(())
}

fn run_setting(db: &Database, cmd: SettingCommand) -> Result<()> {
    match cmd {
        SettingCommand::Get { key } => match db.setting_or_default(&key)? {
            Some(value) => println!("{}", value),
            None => bail!("Unknown setting: {}", key),
        },
        SettingCommand::Set { key, value } => {
            let setting = db.set_setting(&key, &value)?;
            println!("{} = {}", setting.key, setting.value);
        }
        SettingCommand::List => {
            for s in db.list_settings()? {
                println!("{} = {}", s.key, s.value);
            }
        }
    }
    Ok(())
}

fn format_to_par(n: i32) -> String {
    match n {
        0 => "E".to_string(),
        n if n > 0 => format!("+{}", n),
        n => n.to_string(),
    }
}

fn print_leaderboard(board: &Leaderboard) {
    println!(
        "{} {} at {} (par {})\n",
        board.tournament.year, board.tournament.name, board.tournament.course_name, board.total_par
    );
    println!(
        "{:<5} {:<24} {:>4} {:>4} {:>6} {:>4} {:>6} {:>4}",
        "POS", "PLAYER", "HCP", "THRU", "GROSS", "", "NET", ""
    );
    for row in &board.rows {
        println!(
            "{:<5} {:<24} {:>4} {:>4} {:>6} {:>4} {:>6} {:>4}",
            row.display_position(),
            row.player_name,
            row.course_handicap,
            row.thru,
            row.gross,
            format_to_par(row.gross_to_par),
            row.net,
            format_to_par(row.net_to_par)
        );
    }
}
