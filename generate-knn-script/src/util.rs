use std::{
    fs::File,
    io::{self, stdout, BufWriter, StdoutLock},
};

use either::Either;

pub fn file_or_stdout_writer(
    path: Option<&String>,
) -> Result<Either<BufWriter<File>, StdoutLock<'static>>, io::Error> {
    Ok(match path {
        Some(path) => Either::Left(BufWriter::new(File::create(path)?)),
        None => Either::Right(stdout().lock()),
    })
}
