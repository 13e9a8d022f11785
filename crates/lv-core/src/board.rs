use std::fmt;

use serde::{Deserialize, Serialize};

/// Les 8 symboles d'une ligne de plateau valide.
pub const ALPHABET: [char; 8] = [' ', '.', '#', '*', '\\', 'L', 'O', 'R'];

/// Grid cell kind, one per alphabet symbol.
///
/// The tile name is the file stem expected in a tile directory.
///
/// # Example
/// ```
/// use lv_core::board::Tile;
/// assert_eq!(Tile::from_symbol('#'), Some(Tile::Wall));
/// assert_eq!(Tile::Wall.name(), "wall");
/// assert_eq!(Tile::from_symbol('x'), None);
/// assert_eq!(Tile::Lambda.symbol(), '\\');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// ` `
    Empty,
    /// `.`
    Earth,
    /// `#`
    Wall,
    /// `*`
    Rock,
    /// `\`
    Lambda,
    /// `L` (closed lift)
    Lift,
    /// `O`
    OpenLift,
    /// `R`
    Robot,
}

impl Tile {
    /// Every tile, in alphabet order.
    pub const ALL: [Self; 8] = [
        Self::Empty,
        Self::Earth,
        Self::Wall,
        Self::Rock,
        Self::Lambda,
        Self::Lift,
        Self::OpenLift,
        Self::Robot,
    ];

    #[inline]
    #[must_use]
    pub fn from_symbol(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(Self::Empty),
            '.' => Some(Self::Earth),
            '#' => Some(Self::Wall),
            '*' => Some(Self::Rock),
            '\\' => Some(Self::Lambda),
            'L' => Some(Self::Lift),
            'O' => Some(Self::OpenLift),
            'R' => Some(Self::Robot),
            _ => None,
        }
    }

    #[must_use]
    pub fn symbol(self) -> char {
        ALPHABET[self.index()]
    }

    /// Index dans `ALL` / `ALPHABET`.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Nom de fichier de la tuile, sans extension.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Earth => "earth",
            Self::Wall => "wall",
            Self::Rock => "rock",
            Self::Lambda => "lambda",
            Self::Lift => "lift",
            Self::OpenLift => "openlift",
            Self::Robot => "robot",
        }
    }
}

/// Whether a learned board width survives the start of the next board.
///
/// # Example
/// ```
/// use lv_core::board::WidthPolicy;
/// assert_eq!(WidthPolicy::default(), WidthPolicy::Retain);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum WidthPolicy {
    /// The first width seen constrains every later board of the stream.
    #[default]
    Retain,
    /// Each new board learns its width from its own first row.
    PerBoard,
}

/// Phase of the live board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardState {
    /// No board row seen yet.
    Empty,
    /// Valid rows are accumulating.
    Building,
    /// The last board was closed by a separator line. Its rows stay buffered
    /// until the next valid row starts a new board.
    Complete,
}

/// What `Board::accept` did with a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// Valid row that started a new board.
    Started,
    /// Valid row appended to the board being built.
    Extended,
    /// Separator that closed the board being built.
    Finished,
    /// Separator while no board was being built.
    Ignored,
}

/// Un instantané du plateau, construit ligne par ligne.
///
/// A single instance lives for the whole stream and is reset in place each
/// time a valid row follows a separator. Rows must all share one width; a
/// row with a foreign character or the wrong length is a separator, never
/// an error.
///
/// # Example
/// ```
/// use lv_core::board::{Board, BoardState, LineEvent};
/// let mut board = Board::new();
/// assert_eq!(board.accept("#####"), LineEvent::Started);
/// assert_eq!(board.accept("#R.L#"), LineEvent::Extended);
/// assert_eq!(board.accept("Score: 12"), LineEvent::Finished);
/// assert_eq!(board.state(), BoardState::Complete);
/// assert_eq!((board.width(), board.height()), (Some(5), 2));
/// ```
#[derive(Clone, Debug)]
pub struct Board {
    width: Option<usize>,
    lines: Vec<String>,
    state: BoardState,
    policy: WidthPolicy,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(WidthPolicy::default())
    }

    #[must_use]
    pub fn with_policy(policy: WidthPolicy) -> Self {
        Self {
            width: None,
            lines: Vec::new(),
            state: BoardState::Empty,
            policy,
        }
    }

    /// Plateau construit en passant chaque ligne à `accept`.
    ///
    /// Rows follow the same validity rule as a log: a row that does not
    /// fit closes the board and later rows may start a new one.
    ///
    /// # Example
    /// ```
    /// use lv_core::board::Board;
    /// let board = Board::from_rows(&["###", "#R#", "###"]);
    /// assert_eq!(board.height(), 3);
    /// ```
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let mut board = Self::new();
        for row in rows {
            board.accept(row);
        }
        board
    }

    /// Feed one line (trailing newline already stripped).
    pub fn accept(&mut self, line: &str) -> LineEvent {
        if !self.is_valid_row(line) {
            return match self.state {
                BoardState::Building => {
                    self.state = BoardState::Complete;
                    LineEvent::Finished
                }
                BoardState::Empty | BoardState::Complete => LineEvent::Ignored,
            };
        }

        let event = if self.state == BoardState::Building {
            LineEvent::Extended
        } else {
            self.lines.clear();
            if self.policy == WidthPolicy::PerBoard {
                self.width = None;
            }
            LineEvent::Started
        };

        self.state = BoardState::Building;
        self.lines.push(line.to_owned());
        if self.width.is_none() {
            if line.is_empty() {
                log::warn!("Ligne vide en tête de plateau : largeur 0 retenue");
            }
            self.width = Some(line.len());
        }
        event
    }

    /// A row is valid when every character is in the alphabet and, once a
    /// width is known, its length matches.
    #[must_use]
    pub fn is_valid_row(&self, line: &str) -> bool {
        if !line.chars().all(|ch| ALPHABET.contains(&ch)) {
            return false;
        }
        // Alphabet is ASCII: byte length == column count.
        match self.expected_width() {
            Some(width) => line.len() == width,
            None => true,
        }
    }

    /// Width a row must have to be accepted right now.
    fn expected_width(&self) -> Option<usize> {
        match (self.policy, self.state) {
            (WidthPolicy::PerBoard, BoardState::Empty | BoardState::Complete) => None,
            _ => self.width,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> BoardState {
        self.state
    }

    /// `true` unless rows are being accumulated.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state != BoardState::Building
    }

    /// Width in columns, `None` until the first row.
    #[inline]
    #[must_use]
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Columns of the buffered rows. With `WidthPolicy::PerBoard` this is the
    /// length of the current board's rows, not the first width ever seen.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.lines
            .first()
            .map_or_else(|| self.width.unwrap_or(0), String::len)
    }

    /// Tiles of the buffered rows, row-major, as `(column, row, tile)`.
    ///
    /// # Example
    /// ```
    /// use lv_core::board::{Board, Tile};
    /// let board = Board::from_rows(&["#R"]);
    /// let tiles: Vec<_> = board.tiles().collect();
    /// assert_eq!(tiles, vec![(0, 0, Tile::Wall), (1, 0, Tile::Robot)]);
    /// ```
    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.lines.iter().enumerate().flat_map(|(y, line)| {
            line.chars()
                .enumerate()
                .filter_map(move |(x, ch)| Tile::from_symbol(ch).map(|tile| (x, y, tile)))
        })
    }
}

impl PartialEq for Board {
    /// Deux plateaux sont égaux si leurs lignes le sont.
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lines.is_empty() {
            write!(f, "Board (blank)")
        } else {
            write!(f, "Board ({}x{})", self.columns(), self.height())
        }
    }
}
