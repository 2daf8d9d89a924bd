/// The eight Brainfuck operators. Every other character is a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `>`
    MoveRight,
    /// `<`
    MoveLeft,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    LoopStart,
    /// `]`
    LoopEnd,
}

impl Instruction {
    pub fn decode(symbol: char) -> Option<Self> {
        Some(match symbol {
            '+' => Instruction::Increment,
            '-' => Instruction::Decrement,
            '>' => Instruction::MoveRight,
            '<' => Instruction::MoveLeft,
            '.' => Instruction::Output,
            ',' => Instruction::Input,
            '[' => Instruction::LoopStart,
            ']' => Instruction::LoopEnd,
            _ => return None,
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::MoveRight => '>',
            Instruction::MoveLeft => '<',
            Instruction::Output => '.',
            Instruction::Input => ',',
            Instruction::LoopStart => '[',
            Instruction::LoopEnd => ']',
        }
    }
}
