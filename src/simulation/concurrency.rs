use rayon::prelude::*;

pub fn par_iter_mut1<T1: Send + Sync, F: Fn(usize, &mut T1) + Send + Sync>(arr1: &mut [T1], f: F) {
    arr1.into_par_iter().enumerate().for_each(|(idx, v1)| {
        f(idx, v1);
    });
}

#[test]
fn par_iter_mut1_visits_every_index() {
    let mut v = vec![0usize; 1000];
    par_iter_mut1(&mut v, |i, x| *x = i * 2);
    assert!(v.iter().enumerate().all(|(i, &x)| x == i * 2));
}
