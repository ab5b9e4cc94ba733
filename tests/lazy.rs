use std::rc::Rc;

use mackerel::lazy::Lazy;

type Counted = Lazy<u32, i64, String>;

fn cycle() -> String {
    "cycle".to_string()
}

#[test]
fn forces_once_and_memoizes() {
    let cell = Counted::new(|runs: &mut u32| {
        *runs += 1;
        Ok(42)
    });
    let mut runs = 0;
    assert!(!cell.is_forced());
    assert_eq!(cell.get(), None);
    assert_eq!(cell.force(&mut runs, cycle), Ok(42));
    assert_eq!(cell.force(&mut runs, cycle), Ok(42));
    assert_eq!(runs, 1);
    assert!(cell.is_forced());
    assert_eq!(cell.get(), Some(42));
}

#[test]
fn failed_computation_is_retried() {
    let cell = Counted::new(|runs: &mut u32| {
        *runs += 1;
        if *runs < 3 {
            Err(format!("attempt {runs}"))
        } else {
            Ok(*runs as i64)
        }
    });
    let mut runs = 0;
    assert_eq!(cell.force(&mut runs, cycle), Err("attempt 1".to_string()));
    assert!(!cell.is_forced());
    assert!(!cell.is_forcing());
    assert_eq!(cell.force(&mut runs, cycle), Err("attempt 2".to_string()));
    assert_eq!(cell.force(&mut runs, cycle), Ok(3));
    assert_eq!(cell.force(&mut runs, cycle), Ok(3));
    assert_eq!(runs, 3);
}

#[test]
fn ready_cell_never_runs() {
    let cell = Counted::ready(7);
    let mut runs = 0;
    assert!(cell.is_forced());
    assert_eq!(cell.force(&mut runs, cycle), Ok(7));
    assert_eq!(runs, 0);
}

struct Holder {
    cell: Option<Rc<Lazy<Holder, i64, String>>>,
}

#[test]
fn forcing_from_inside_reports_cycle() {
    let cell = Rc::new(Lazy::<Holder, i64, String>::new(|holder: &mut Holder| {
        let inner = holder.cell.clone().ok_or_else(|| "unbound".to_string())?;
        inner.force(holder, cycle)
    }));
    let mut holder = Holder {
        cell: Some(Rc::clone(&cell)),
    };
    assert_eq!(cell.force(&mut holder, cycle), Err("cycle".to_string()));
    assert!(!cell.is_forcing());
    assert!(!cell.is_forced());
}
